use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::{Catalog, Lesson, KEY_SEPARATOR};
use crate::bot::callback::{Callback, MAX_CALLBACK_BYTES};

const BUILTIN_CATALOG: &str = include_str!("../../courses.json");

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to open catalog file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(BUILTIN_CATALOG)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let file = File::open(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Picks the configured catalog file, falling back to the built-in one.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        let catalog = match path {
            Some(path) => {
                log::info!("Loading courses from {}", path.display());
                Self::from_file(path)?
            }
            None => {
                log::info!("Using the built-in course catalog");
                Self::builtin()?
            }
        };

        for problem in catalog.problems() {
            log::warn!("Course catalog: {}", problem);
        }
        log::info!(
            "Loaded {} modules, {} lessons",
            catalog.modules.len(),
            catalog.modules.iter().map(|m| m.lessons.len()).sum::<usize>()
        );
        Ok(catalog)
    }

    /// Content mistakes that don't stop the bot but make parts of it unusable.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut module_names = HashSet::new();

        for module in &self.modules {
            if !module_names.insert(module.name.as_str()) {
                problems.push(format!("duplicate module \"{}\"", module.name));
            }
            // Callback tokens split on the first separator
            if module.name.contains(KEY_SEPARATOR) {
                problems.push(format!(
                    "module \"{}\" contains '{}' and can't be selected",
                    module.name, KEY_SEPARATOR
                ));
            }
            if !Callback::Module(module.name.clone()).fits() {
                problems.push(format!(
                    "module \"{}\" is too long for a button (over {} bytes)",
                    module.name, MAX_CALLBACK_BYTES
                ));
            }

            let mut lesson_names = HashSet::new();
            for lesson in &module.lessons {
                if !lesson_names.insert(lesson.name.as_str()) {
                    problems.push(format!(
                        "duplicate lesson \"{}\" in module \"{}\"",
                        lesson.name, module.name
                    ));
                }
                problems.extend(oversized_buttons(&module.name, lesson));
                for question in &lesson.quiz {
                    if !question.options.contains(&question.answer) {
                        problems.push(format!(
                            "{}/{}: answer \"{}\" is not one of the options of \"{}\"",
                            module.name, lesson.name, question.answer, question.text
                        ));
                    }
                }
            }
        }

        problems
    }
}

/// Buttons of a lesson whose callback data Telegram would reject.
fn oversized_buttons(module: &str, lesson: &Lesson) -> Vec<String> {
    let mut problems = Vec::new();

    // "lesson:" is longer than "quiz:", so it covers the quiz button too
    let selection = Callback::Lesson {
        module: module.to_string(),
        lesson: lesson.name.clone(),
    };
    if !selection.fits() {
        problems.push(format!(
            "{}/{}: lesson name is too long for a button (over {} bytes)",
            module, lesson.name, MAX_CALLBACK_BYTES
        ));
    }

    for (index, question) in lesson.quiz.iter().enumerate() {
        for option in &question.options {
            let answer = Callback::Answer {
                question: index,
                option: option.clone(),
            };
            if !answer.fits() {
                problems.push(format!(
                    "{}/{}: option \"{}\" is too long for a button (over {} bytes)",
                    module, lesson.name, option, MAX_CALLBACK_BYTES
                ));
            }
        }
    }

    problems
}

/// Treats `""` and `null` the same as a missing key.
pub(super) fn non_empty_path<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|path| !path.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::{Module, Question};
    use std::io::Write;

    #[test]
    fn builtin_catalog_parses() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.modules.len(), 2);
        assert!(catalog.problems().is_empty());

        let lesson = catalog.lesson("Модуль 1", "Урок 1").unwrap();
        assert_eq!(lesson.image.as_deref(), Some("./files/Group 15.jpg"));
        assert_eq!(lesson.video, None);
        assert_eq!(lesson.file, None);
        assert_eq!(lesson.quiz.len(), 2);
        assert_eq!(lesson.quiz[0].answer, "Париж");
        assert_eq!(lesson.quiz[0].options, vec!["Берлин", "Париж", "Рим", "Мадрид"]);
    }

    #[test]
    fn optional_fields_may_be_missing() {
        let catalog: Catalog = serde_json::from_str(
            r#"[{"name": "M", "lessons": [{"name": "L", "text": "t", "video": null}]}]"#,
        )
        .unwrap();
        let lesson = catalog.lesson("M", "L").unwrap();
        assert_eq!(lesson.image, None);
        assert_eq!(lesson.video, None);
        assert!(lesson.quiz.is_empty());
    }

    #[test]
    fn problems_are_reported() {
        let catalog: Catalog = serde_json::from_str(
            r#"[
                {"name": "A:B", "lessons": []},
                {"name": "M", "lessons": [
                    {"name": "L", "quiz": [{"question": "q", "options": ["x"], "answer": "y"}]},
                    {"name": "L"}
                ]},
                {"name": "M"}
            ]"#,
        )
        .unwrap();
        let problems = catalog.problems();
        assert_eq!(problems.len(), 4, "{:?}", problems);
    }

    #[test]
    fn long_names_are_reported() {
        let long_option = "Очень длинный вариант ответа, который не влезет в кнопку";
        let catalog = Catalog::new(vec![Module {
            name: "Модуль 1".into(),
            lessons: vec![
                Lesson {
                    name: "Урок 1: Введение в историю древнего мира и культуры".into(),
                    ..Lesson::default()
                },
                Lesson {
                    name: "Урок 2".into(),
                    quiz: vec![Question::new(
                        "q",
                        vec!["да".into(), long_option.into()],
                        "да",
                    )],
                    ..Lesson::default()
                },
            ],
        }]);

        let problems = catalog.problems();
        assert_eq!(problems.len(), 2, "{:?}", problems);
        assert!(problems[0].contains("Урок 1: Введение"));
        assert!(problems[1].contains(long_option));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name": "Only", "lessons": [{{"name": "One", "text": "hi"}}]}}]"#)
            .unwrap();

        let catalog = Catalog::load(Some(file.path())).unwrap();
        assert_eq!(catalog.module_names().collect::<Vec<_>>(), vec!["Only"]);
    }

    #[test]
    fn broken_files_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            Catalog::from_file(&missing),
            Err(CatalogError::Io { .. })
        ));

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "{ not json").unwrap();
        assert!(matches!(
            Catalog::from_file(&garbage),
            Err(CatalogError::Parse(_))
        ));
    }
}
