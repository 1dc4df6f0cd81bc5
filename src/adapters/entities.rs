use crate::core::entities::DATE_LABEL;
use crate::domain::model::Entity;
use crate::domain::ports::EntityRecognizer;
use crate::utils::error::{Result, StatementError};
use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const MONTHS: &str = r"(?:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)";

struct Rule {
    label: &'static str,
    regex: Regex,
}

/// In-process recognizer built from regular expressions. Labels follow the
/// usual NER tag names (DATE, MONEY, PERCENT, CARDINAL) so it can stand in
/// for a statistical model.
pub struct PatternEntityRecognizer {
    rules: Vec<Rule>,
}

impl PatternEntityRecognizer {
    pub fn new() -> Result<Self> {
        let sources = [
            (DATE_LABEL, r"\b\d{1,2}/\d{1,2}/\d{2,4}\b".to_string()),
            (DATE_LABEL, r"\b\d{4}-\d{2}-\d{2}\b".to_string()),
            (
                DATE_LABEL,
                format!(r"\b{}\.?\s+\d{{1,2}}(?:st|nd|rd|th)?,?\s+\d{{4}}\b", MONTHS),
            ),
            (
                DATE_LABEL,
                format!(r"\b\d{{1,2}}(?:st|nd|rd|th)?\s+{}\.?,?\s+\d{{4}}\b", MONTHS),
            ),
            (
                "MONEY",
                r"[$€£¥]\s?\d[\d,]*(?:\.\d{2})?|\b(?:USD|EUR|GBP|INR|Rs\.?)\s?\d[\d,]*(?:\.\d{2})?|\b\d[\d,]*(?:\.\d{2})?\s?(?:USD|EUR|GBP|INR)\b".to_string(),
            ),
            ("PERCENT", r"\b\d+(?:\.\d+)?\s?%".to_string()),
            ("CARDINAL", r"\b\d[\d,]*(?:\.\d+)?\b".to_string()),
        ];

        let rules = sources
            .into_iter()
            .map(|(label, source)| {
                Regex::new(&source)
                    .map(|regex| Rule { label, regex })
                    .map_err(|e| StatementError::ConfigError {
                        message: format!("invalid {} pattern: {}", label, e),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Matches in text order. Where spans overlap the earliest start wins,
    /// then the longest span, then the rule listed first.
    pub fn find_entities(&self, text: &str) -> Vec<Entity> {
        let mut spans: Vec<(usize, usize, usize, &'static str)> = Vec::new();
        for (priority, rule) in self.rules.iter().enumerate() {
            for m in rule.regex.find_iter(text) {
                spans.push((m.start(), m.end(), priority, rule.label));
            }
        }
        spans.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| (b.1 - b.0).cmp(&(a.1 - a.0)))
                .then_with(|| a.2.cmp(&b.2))
        });

        let mut entities = Vec::new();
        let mut covered_until = 0;
        for (start, end, _, label) in spans {
            if start < covered_until {
                continue;
            }
            entities.push(Entity::new(text[start..end].trim_end(), label));
            covered_until = end;
        }
        entities
    }
}

#[async_trait]
impl EntityRecognizer for PatternEntityRecognizer {
    async fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        Ok(self.find_entities(text))
    }
}

/// Delegates to an external NER program: the text goes to its stdin and it
/// answers with JSON, either one `{"text", "label"}` object per line or a
/// single array of them.
#[derive(Debug, Clone)]
pub struct CommandEntityRecognizer {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandEntityRecognizer {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// First element is the program, the rest its arguments.
    pub fn from_command_line(command: &[String]) -> Result<Self> {
        let (program, args) = command.split_first().ok_or_else(|| StatementError::ConfigError {
            message: "entities.command must name a program".to_string(),
        })?;
        Ok(Self::new(program, args.to_vec()))
    }
}

pub fn parse_entity_output(stdout: &str) -> Result<Vec<Entity>> {
    let trimmed = stdout.trim();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|e| {
            StatementError::recognition(format!("malformed entity array: {}", e))
        });
    }

    trimmed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| {
                StatementError::recognition(format!(
                    "malformed entity on output line {}: {}",
                    index + 1,
                    e
                ))
            })
        })
        .collect()
}

#[async_trait]
impl EntityRecognizer for CommandEntityRecognizer {
    async fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                StatementError::recognition(format!(
                    "failed to execute {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            StatementError::recognition("entity command stdin was not captured")
        })?;
        let input = text.as_bytes().to_vec();
        // The child may fill its stdout pipe before it has read all of stdin.
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            result
        });

        let output = child.wait_with_output().await.map_err(|e| {
            StatementError::recognition(format!(
                "failed waiting for {}: {}",
                self.program.display(),
                e
            ))
        })?;
        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Writing to entity command stdin failed: {}", e),
            Err(e) => tracing::warn!("Entity command stdin task failed: {}", e),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StatementError::recognition(format!(
                "{} returned non-zero exit status: {}",
                self.program.display(),
                stderr.trim()
            )));
        }

        let entities = parse_entity_output(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!(
            "{} recognized {} entities",
            self.program.display(),
            entities.len()
        );
        Ok(entities)
    }
}

/// Recognizer picked from configuration at startup.
pub enum ConfiguredEntityRecognizer {
    Pattern(PatternEntityRecognizer),
    Command(CommandEntityRecognizer),
}

impl ConfiguredEntityRecognizer {
    pub fn from_command(command: Option<&[String]>) -> Result<Self> {
        match command {
            Some(command) => Ok(Self::Command(CommandEntityRecognizer::from_command_line(
                command,
            )?)),
            None => Ok(Self::Pattern(PatternEntityRecognizer::new()?)),
        }
    }
}

#[async_trait]
impl EntityRecognizer for ConfiguredEntityRecognizer {
    async fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        match self {
            Self::Pattern(recognizer) => recognizer.recognize(text).await,
            Self::Command(recognizer) => recognizer.recognize(text).await,
        }
    }
}
