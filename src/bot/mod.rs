//! Transport-independent bot logic: an [`Inbound`] event goes in, a list of
//! [`Outbound`] send commands comes out.

pub mod callback;

pub use callback::Callback;

use crate::access::{AccessGate, AccessOutcome};
use crate::course::{self, Catalog, Lesson, Question};
use crate::ledger::{Ledger, RecordOutcome, TestResult};
use crate::quiz::{AnswerOutcome, QuizSessions, StartOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Modules,
    Progress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command(Command),
    /// Free text that isn't a command.
    Text(String),
    Button(Callback),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub user_id: String,
    pub event: Event,
}

impl Inbound {
    pub fn new(user_id: impl Into<String>, event: Event) -> Self {
        Self {
            user_id: user_id.into(),
            event,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub callback: Callback,
}

impl Button {
    pub fn new(label: impl Into<String>, callback: Callback) -> Self {
        Self {
            label: label.into(),
            callback,
        }
    }
}

/// Rows of buttons.
pub type Keyboard = Vec<Vec<Button>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text {
        text: String,
        keyboard: Option<Keyboard>,
    },
    /// Replace the message whose button was pressed.
    Edit {
        text: String,
        keyboard: Option<Keyboard>,
    },
    Photo {
        path: String,
        caption: String,
    },
    Video {
        path: String,
    },
    Document {
        path: String,
    },
}

impl Outbound {
    fn text(text: impl Into<String>) -> Self {
        Outbound::Text {
            text: text.into(),
            keyboard: None,
        }
    }

    fn menu(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Outbound::Text {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

const GREETING_TEXT: &str =
    "Добро пожаловать в Образовательного Бота! Пожалуйста, введите код доступа, чтобы продолжить:";
const ACCESS_GRANTED: &str =
    "Доступ предоставлен! Используйте /modules, чтобы просмотреть доступные курсы.";
const ALREADY_AUTHORIZED: &str =
    "Вы уже авторизованы! Используйте /modules, чтобы просмотреть курсы.";
const WRONG_CODE: &str = "Неверный код доступа. Попробуйте снова.";
const CODE_REQUIRED: &str = "Пожалуйста, сначала введите правильный код доступа.";
const CHOOSE_MODULE: &str = "Выберите модуль:";
const NO_MODULES: &str = "Курсы пока не добавлены.";
const QUIZ_PROMPT: &str = "Хотите проверить свои знания?";
const TAKE_QUIZ: &str = "Пройти тест";
const NO_QUIZ: &str = "Для этого урока нет теста.";
const NO_PROGRESS: &str = "У вас пока нет записей о прогрессе.";

/// All mutable bot state. Owned by the transport behind a single lock.
pub struct CourseBot {
    catalog: Catalog,
    gate: AccessGate,
    sessions: QuizSessions,
    ledger: Ledger,
}

impl CourseBot {
    pub fn new(catalog: Catalog, gate: AccessGate, ledger: Ledger) -> Self {
        Self {
            catalog,
            gate,
            sessions: QuizSessions::new(),
            ledger,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Writes the ledger once more, used on shutdown.
    pub fn flush(&self) {
        self.ledger.save();
    }

    pub fn handle(&mut self, inbound: Inbound) -> Vec<Outbound> {
        let Inbound { user_id, event } = inbound;
        let user_id = user_id.as_str();

        match event {
            Event::Command(Command::Start) => vec![Outbound::text(GREETING_TEXT)],
            Event::Text(text) => self.check_access_code(user_id, &text),
            Event::Command(_) | Event::Button(_) if !self.gate.is_authorized(user_id) => {
                log::debug!("Unauthorized request from user {}", user_id);
                vec![Outbound::text(CODE_REQUIRED)]
            }
            Event::Command(Command::Modules) => self.show_modules(),
            Event::Command(Command::Progress) => self.show_progress(user_id),
            Event::Button(Callback::Module(module)) => self.module_selected(&module),
            Event::Button(Callback::Lesson { module, lesson }) => {
                self.lesson_selected(&module, &lesson)
            }
            Event::Button(Callback::StartQuiz { module, lesson }) => {
                self.start_quiz(user_id, &module, &lesson)
            }
            Event::Button(Callback::Answer { question, option }) => {
                self.handle_quiz_answer(user_id, question, &option)
            }
        }
    }

    fn check_access_code(&mut self, user_id: &str, attempt: &str) -> Vec<Outbound> {
        let reply = match self.gate.check(user_id, attempt) {
            AccessOutcome::Granted => ACCESS_GRANTED,
            AccessOutcome::AlreadyAuthorized => ALREADY_AUTHORIZED,
            AccessOutcome::Rejected => WRONG_CODE,
        };
        vec![Outbound::text(reply)]
    }

    fn show_modules(&self) -> Vec<Outbound> {
        if self.catalog.modules.is_empty() {
            return vec![Outbound::text(NO_MODULES)];
        }

        let keyboard = self
            .catalog
            .module_names()
            .map(|module| vec![Button::new(module, Callback::Module(module.to_string()))])
            .collect();
        vec![Outbound::menu(CHOOSE_MODULE, keyboard)]
    }

    fn module_selected(&self, module_name: &str) -> Vec<Outbound> {
        let Some(module) = self.catalog.module(module_name) else {
            log::warn!("Unknown module selected: {}", module_name);
            return Vec::new();
        };

        let keyboard = module
            .lessons
            .iter()
            .map(|lesson| {
                vec![Button::new(
                    lesson.name.as_str(),
                    Callback::Lesson {
                        module: module.name.clone(),
                        lesson: lesson.name.clone(),
                    },
                )]
            })
            .collect();
        vec![Outbound::Edit {
            text: format!("Вы выбрали {}. Пожалуйста, выберите урок:", module.name),
            keyboard: Some(keyboard),
        }]
    }

    fn lesson_selected(&self, module_name: &str, lesson_name: &str) -> Vec<Outbound> {
        let Some(lesson) = self.catalog.lesson(module_name, lesson_name) else {
            log::warn!("Unknown lesson selected: {}/{}", module_name, lesson_name);
            return Vec::new();
        };

        let mut replies = lesson_content(lesson);
        let keyboard = vec![vec![Button::new(
            TAKE_QUIZ,
            Callback::StartQuiz {
                module: module_name.to_string(),
                lesson: lesson_name.to_string(),
            },
        )]];
        replies.push(Outbound::menu(QUIZ_PROMPT, keyboard));
        replies
    }

    fn start_quiz(&mut self, user_id: &str, module_name: &str, lesson_name: &str) -> Vec<Outbound> {
        let Some(lesson) = self.catalog.lesson(module_name, lesson_name) else {
            log::warn!("Quiz requested for unknown lesson {}/{}", module_name, lesson_name);
            return Vec::new();
        };

        let test_id = course::test_id(module_name, lesson_name);
        match self.sessions.start(user_id, test_id, &lesson.quiz) {
            StartOutcome::Started(first) => vec![question_message(0, &first)],
            StartOutcome::NoQuestions => vec![Outbound::Edit {
                text: NO_QUIZ.to_string(),
                keyboard: None,
            }],
        }
    }

    fn handle_quiz_answer(&mut self, user_id: &str, index: usize, answer: &str) -> Vec<Outbound> {
        match self.sessions.answer(user_id, index, answer) {
            AnswerOutcome::Next { index, question } => vec![question_message(index, &question)],
            AnswerOutcome::Finished {
                test_id,
                correct,
                total,
            } => self.show_quiz_results(user_id, &test_id, TestResult { correct, total }),
            AnswerOutcome::Ignored => Vec::new(),
        }
    }

    fn show_quiz_results(&mut self, user_id: &str, test_id: &str, result: TestResult) -> Vec<Outbound> {
        let reply = match self.ledger.record(user_id, test_id, result) {
            RecordOutcome::AlreadyRecorded => format!(
                "Вы уже прошли тест для {}. Результаты не записаны повторно.",
                test_id
            ),
            RecordOutcome::Recorded => format!(
                "Тест завершен!\nВы ответили правильно на {} из {} вопросов.",
                result.correct, result.total
            ),
        };
        vec![Outbound::text(reply)]
    }

    fn show_progress(&self, user_id: &str) -> Vec<Outbound> {
        let Some(progress) = self.ledger.user_results(user_id) else {
            return vec![Outbound::text(NO_PROGRESS)];
        };

        let mut text = String::from("Ваш прогресс:\n");
        for (test, result) in progress {
            text.push_str(&format!(
                "{}: {} из {} правильно ({:.2}%)\n",
                test,
                result.correct,
                result.total,
                result.percentage()
            ));
        }
        vec![Outbound::text(text)]
    }
}

/// Caption or plain text, then the optional video and file.
fn lesson_content(lesson: &Lesson) -> Vec<Outbound> {
    let caption = format!("Урок: {}\n{}", lesson.name, lesson.text);
    let mut replies = vec![match &lesson.image {
        Some(path) => Outbound::Photo {
            path: path.clone(),
            caption,
        },
        None => Outbound::text(caption),
    }];

    if let Some(path) = &lesson.video {
        replies.push(Outbound::Video { path: path.clone() });
    }
    if let Some(path) = &lesson.file {
        replies.push(Outbound::Document { path: path.clone() });
    }
    replies
}

/// Answer buttons carry the question index so a late tap can't answer the
/// next question.
fn question_message(index: usize, question: &Question) -> Outbound {
    let keyboard = question
        .options
        .iter()
        .map(|option| {
            vec![Button::new(
                option.as_str(),
                Callback::Answer {
                    question: index,
                    option: option.clone(),
                },
            )]
        })
        .collect();
    Outbound::menu(question.text.as_str(), keyboard)
}
