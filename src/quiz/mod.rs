use std::collections::HashMap;

use crate::course::Question;

/// One user's run through a lesson's quiz.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quiz {
    pub test_id: String,
    pub questions: Vec<Question>,
    pub current_question: usize,
    pub score: usize,
}

impl Quiz {
    pub fn new(test_id: String, questions: Vec<Question>) -> Self {
        Self {
            test_id,
            questions,
            current_question: 0,
            score: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn is_finished(&self) -> bool {
        self.current_question >= self.questions.len()
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.current_question)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    /// The quiz is running, here is the first question.
    Started(Question),
    NoQuestions,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    Next { index: usize, question: Question },
    Finished {
        test_id: String,
        correct: usize,
        total: usize,
    },
    /// No session, the session already ended, or the answer was for
    /// another question.
    Ignored,
}

/// Quiz sessions keyed by user id. A new start overwrites the previous
/// session; finished sessions stay until then.
#[derive(Debug, Default)]
pub struct QuizSessions {
    sessions: HashMap<String, Quiz>,
}

impl QuizSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, user_id: &str, test_id: String, questions: &[Question]) -> StartOutcome {
        let Some(first) = questions.first().cloned() else {
            return StartOutcome::NoQuestions;
        };

        log::info!("User {} started quiz {}", user_id, test_id);
        self.sessions
            .insert(user_id.to_string(), Quiz::new(test_id, questions.to_vec()));
        StartOutcome::Started(first)
    }

    /// `index` is the question the answer was given for. Anything but the
    /// current question is a stale button and changes nothing.
    pub fn answer(&mut self, user_id: &str, index: usize, answer: &str) -> AnswerOutcome {
        let Some(quiz) = self.sessions.get_mut(user_id) else {
            log::debug!("Answer from user {} without a quiz", user_id);
            return AnswerOutcome::Ignored;
        };
        let Some(question) = quiz.current() else {
            log::debug!("Late answer from user {} to finished quiz {}", user_id, quiz.test_id);
            return AnswerOutcome::Ignored;
        };
        if index != quiz.current_question {
            log::debug!(
                "Stale answer from user {} for question {}, current is {}",
                user_id,
                index,
                quiz.current_question
            );
            return AnswerOutcome::Ignored;
        }

        if question.is_correct(answer) {
            quiz.score += 1;
        }
        quiz.current_question += 1;

        match quiz.current() {
            Some(next) => AnswerOutcome::Next {
                index: quiz.current_question,
                question: next.clone(),
            },
            None => AnswerOutcome::Finished {
                test_id: quiz.test_id.clone(),
                correct: quiz.score,
                total: quiz.total(),
            },
        }
    }

    pub fn get(&self, user_id: &str) -> Option<&Quiz> {
        self.sessions.get(user_id)
    }
}
