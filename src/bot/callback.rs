use std::fmt;

use crate::course::KEY_SEPARATOR;

/// Payload carried by an inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Module(String),
    Lesson { module: String, lesson: String },
    StartQuiz { module: String, lesson: String },
    Answer { question: usize, option: String },
}

/// Telegram rejects `callback_data` longer than this.
pub const MAX_CALLBACK_BYTES: usize = 64;

const MODULE: &str = "module";
const LESSON: &str = "lesson";
const QUIZ: &str = "quiz";
const ANSWER: &str = "answer";

impl Callback {
    /// Module names can't contain the separator; lesson names and options can.
    pub fn parse(data: &str) -> Option<Self> {
        let (kind, rest) = data.split_once(KEY_SEPARATOR)?;
        let module_and_lesson = || {
            rest.split_once(KEY_SEPARATOR)
                .map(|(module, lesson)| (module.to_string(), lesson.to_string()))
        };

        match kind {
            MODULE => Some(Callback::Module(rest.to_string())),
            LESSON => {
                let (module, lesson) = module_and_lesson()?;
                Some(Callback::Lesson { module, lesson })
            }
            QUIZ => {
                let (module, lesson) = module_and_lesson()?;
                Some(Callback::StartQuiz { module, lesson })
            }
            ANSWER => {
                let (question, option) = rest.split_once(KEY_SEPARATOR)?;
                Some(Callback::Answer {
                    question: question.parse().ok()?,
                    option: option.to_string(),
                })
            }
            _ => None,
        }
    }

    /// Whether Telegram will accept this callback as button data.
    pub fn fits(&self) -> bool {
        self.to_string().len() <= MAX_CALLBACK_BYTES
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = KEY_SEPARATOR;
        match self {
            Callback::Module(module) => write!(f, "{MODULE}{sep}{module}"),
            Callback::Lesson { module, lesson } => write!(f, "{LESSON}{sep}{module}{sep}{lesson}"),
            Callback::StartQuiz { module, lesson } => write!(f, "{QUIZ}{sep}{module}{sep}{lesson}"),
            Callback::Answer { question, option } => write!(f, "{ANSWER}{sep}{question}{sep}{option}"),
        }
    }
}
