pub mod loader;

/// Separator used inside test identifiers ("module:lesson") and callback tokens.
pub const KEY_SEPARATOR: char = ':';

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Module {
    pub name: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Lesson {
    pub name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, deserialize_with = "loader::non_empty_path")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "loader::non_empty_path")]
    pub video: Option<String>,
    #[serde(default, deserialize_with = "loader::non_empty_path")]
    pub file: Option<String>,
    #[serde(default)]
    pub quiz: Vec<Question>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    pub options: Vec<String>,
    pub answer: String,
}

impl Question {
    pub fn new(text: impl Into<String>, options: Vec<String>, answer: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options,
            answer: answer.into(),
        }
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        self.answer == answer
    }
}

impl Catalog {
    pub fn new(modules: Vec<Module>) -> Self {
        Self { modules }
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn lesson(&self, module: &str, lesson: &str) -> Option<&Lesson> {
        self.module(module)?.lesson(lesson)
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.name.as_str())
    }
}

impl Module {
    pub fn lesson(&self, name: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.name == name)
    }
}

/// Ledger key of a lesson's quiz.
pub fn test_id(module: &str, lesson: &str) -> String {
    format!("{}{}{}", module, KEY_SEPARATOR, lesson)
}
