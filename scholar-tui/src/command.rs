use scholar_common::QuestionCount;
use scholar_study::{Choice, PaperRef, StudyCommand};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Study(StudyCommand),
    Help,          // /help
    Quit,          // /quit or /exit
    Clear,         // /clear
    Usage(String), // known verb, bad arguments
    Unknown(String),
}

pub fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return Command::Unknown(trimmed.to_string());
    }
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or_default();
    let rest = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let study = match verb {
        "/search" => StudyCommand::Search(rest.map(str::to_string)),
        "/select" => match rest {
            Some(paper) => StudyCommand::Select(parse_paper(paper)),
            None => return usage("/select <number or title>"),
        },
        "/fetch" => StudyCommand::Fetch,
        "/summary" => StudyCommand::Summarize,
        "/qa" => StudyCommand::GenerateQuestionBank,
        "/quiz" => StudyCommand::GenerateQuiz,
        "/answer" => match rest.and_then(parse_answer) {
            Some((question, choice)) => StudyCommand::Answer { question, choice },
            None => return usage("/answer <question number> <A|B|C|D|skip>"),
        },
        "/submit" => StudyCommand::Submit,
        "/style" => match rest.map(str::parse) {
            Some(Ok(style)) => StudyCommand::SetExplanation(style),
            Some(Err(e)) => return Command::Usage(e.to_string()),
            None => return usage("/style <basic|detailed|real-world|best-practices|common-challenges>"),
        },
        "/length" => match rest.map(str::parse) {
            Some(Ok(length)) => StudyCommand::SetLength(length),
            Some(Err(e)) => return Command::Usage(e.to_string()),
            None => return usage("/length <short|medium|long>"),
        },
        "/count" => match rest.map(|r| r.parse::<u32>()) {
            Some(Ok(n)) => match QuestionCount::new(n) {
                Ok(count) => StudyCommand::SetQuestionCount(count),
                Err(e) => return Command::Usage(e.to_string()),
            },
            _ => return usage("/count <1-10>"),
        },
        "/topic" => match rest {
            Some(topic) => StudyCommand::SetTopic(topic.to_string()),
            None => return usage("/topic <text>"),
        },
        "/help" => return Command::Help,
        "/quit" | "/exit" => return Command::Quit,
        "/clear" => return Command::Clear,
        _ => return Command::Unknown(trimmed.to_string()),
    };
    Command::Study(study)
}

fn usage(form: &str) -> Command {
    Command::Usage(format!("Usage: {form}"))
}

fn parse_paper(raw: &str) -> PaperRef {
    match raw.parse() {
        Ok(paper) => paper,
        Err(never) => match never {},
    }
}

fn parse_answer(rest: &str) -> Option<(usize, Choice)> {
    let mut args = rest.split_whitespace();
    let question = args.next()?.trim_start_matches('Q').trim_start_matches('q');
    let question = question.parse().ok()?;
    let choice = args.next()?.parse().ok()?;
    if args.next().is_some() {
        return None;
    }
    Some((question, choice))
}

pub const HELP: &[(&str, &str)] = &[
    ("/search [topic]", "search Google Scholar (current topic if omitted)"),
    ("/select <n|title>", "pick a paper from the results"),
    ("/fetch", "retrieve the full text of the selected paper"),
    ("/summary", "generate summarized notes"),
    ("/qa", "generate a question bank and flashcards"),
    ("/quiz", "generate a practice quiz"),
    ("/answer <n> <A-D|skip>", "answer quiz question n"),
    ("/submit", "score the quiz"),
    ("/style <s>", "basic, detailed, real-world, best-practices, common-challenges"),
    ("/length <l>", "short, medium, long"),
    ("/count <1-10>", "number of questions to generate"),
    ("/topic <text>", "change the topic without searching"),
    ("/clear", "clear the message log"),
    ("/quit", "exit"),
];
