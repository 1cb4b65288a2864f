use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use docx_rs::{Docx, LineSpacing, Paragraph, Run, RunFonts};
use serde::{Deserialize, Serialize};

/// Accent color for organization turns (RGB 171, 25, 66)
const ACCENT_COLOR: &str = "AB1942";
const FONT: &str = "SimHei";
/// 15pt, in half-points
const FONT_SIZE: usize = 30;
/// 8pt before, 24pt after, in twentieths of a point
const SPACE_BEFORE: u32 = 160;
const SPACE_AFTER: u32 = 480;
/// Colon written after the speaker in styled output
const FULL_WIDTH_COLON: char = '：';

/// Output document format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Chosen by the output file extension
    #[default]
    Auto,
    Text,
    Docx,
}

impl OutputFormat {
    /// Resolve `Auto` against the output path: `.docx` is styled, anything else text
    pub fn resolve(self, path: &Path) -> OutputFormat {
        match self {
            OutputFormat::Auto => {
                let is_docx = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"));
                if is_docx {
                    OutputFormat::Docx
                } else {
                    OutputFormat::Text
                }
            }
            other => other,
        }
    }
}

/// How a document paragraph is styled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyledParagraph<'a> {
    /// Organization turn: bold accent-colored speaker and content
    Organization { speaker: &'a str, content: &'a str },
    /// Interviewee (or other named) turn: bold speaker, plain content
    Speaker { speaker: &'a str, content: &'a str },
    /// No speaker delimiter
    Plain(&'a str),
}

/// Classify a paragraph by splitting on its first `": "` or full-width colon.
///
/// A bare ASCII colon (as in `3:00`) is not a speaker delimiter.
pub fn classify_paragraph<'a>(paragraph: &'a str, organization_label: &str) -> StyledParagraph<'a> {
    let ascii = paragraph.find(": ").map(|at| (at, ": ".len()));
    let full_width = paragraph
        .find(FULL_WIDTH_COLON)
        .map(|at| (at, FULL_WIDTH_COLON.len_utf8()));
    let delimiter = match (ascii, full_width) {
        (Some(a), Some(f)) => Some(if a.0 < f.0 { a } else { f }),
        (a, f) => a.or(f),
    };

    let Some((at, delimiter_len)) = delimiter else {
        return StyledParagraph::Plain(paragraph);
    };

    let speaker = paragraph[..at].trim();
    let content = paragraph[at + delimiter_len..].trim_start();

    if speaker.is_empty() {
        StyledParagraph::Plain(paragraph)
    } else if speaker == organization_label {
        StyledParagraph::Organization { speaker, content }
    } else {
        StyledParagraph::Speaker { speaker, content }
    }
}

/// Document paragraphs: every non-blank line of the body
pub fn document_paragraphs(body: &str) -> Vec<&str> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Write the assembled body as UTF-8 text
pub fn write_text(body: &str, path: &Path) -> Result<()> {
    std::fs::write(path, body).with_context(|| format!("Failed to write file: {:?}", path))
}

/// Render the body into a styled `.docx` document
pub fn write_docx(body: &str, organization_label: &str, path: &Path) -> Result<()> {
    let mut docx = Docx::new();

    for paragraph in document_paragraphs(body) {
        docx = docx.add_paragraph(styled_paragraph(classify_paragraph(
            paragraph,
            organization_label,
        )));
    }

    let file =
        File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    docx.build()
        .pack(file)
        .with_context(|| format!("Failed to write document: {:?}", path))?;
    Ok(())
}

fn styled_paragraph(paragraph: StyledParagraph<'_>) -> Paragraph {
    let spaced = Paragraph::new().line_spacing(
        LineSpacing::new()
            .before(SPACE_BEFORE)
            .after(SPACE_AFTER),
    );

    match paragraph {
        StyledParagraph::Organization { speaker, content } => spaced
            .add_run(run(&speaker_label(speaker)).bold().color(ACCENT_COLOR))
            .add_run(run(content).bold().color(ACCENT_COLOR)),
        StyledParagraph::Speaker { speaker, content } => spaced
            .add_run(run(&speaker_label(speaker)).bold())
            .add_run(run(content)),
        StyledParagraph::Plain(text) => spaced.add_run(run(text)),
    }
}

fn speaker_label(speaker: &str) -> String {
    format!("{}{}", speaker, FULL_WIDTH_COLON)
}

fn run(text: &str) -> Run {
    Run::new()
        .add_text(text)
        .size(FONT_SIZE)
        .fonts(RunFonts::new().ascii(FONT).hi_ansi(FONT).east_asia(FONT))
}

/// Machine-readable summary of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub model: String,
    pub input_lines: usize,
    pub turns: usize,
    pub paired_turns: usize,
    pub chunks: usize,
    pub chunks_succeeded: usize,
    pub chunks_failed: usize,
    pub failed_chunk_indices: Vec<usize>,
    pub output_path: String,
}

impl RunReport {
    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use docx_rs::{BuildXML, ParagraphChild};
    use regex::Regex;

    use super::*;

    #[test]
    fn test_resolve_format() {
        assert_eq!(
            OutputFormat::Auto.resolve(Path::new("out/result.DOCX")),
            OutputFormat::Docx
        );
        assert_eq!(
            OutputFormat::Auto.resolve(Path::new("out/result.txt")),
            OutputFormat::Text
        );
        assert_eq!(
            OutputFormat::Auto.resolve(Path::new("no_extension")),
            OutputFormat::Text
        );
        assert_eq!(
            OutputFormat::Text.resolve(Path::new("forced.docx")),
            OutputFormat::Text
        );
    }

    #[test]
    fn test_classify_paragraph() {
        assert_eq!(
            classify_paragraph("Org: welcome back", "Org"),
            StyledParagraph::Organization {
                speaker: "Org",
                content: "welcome back"
            }
        );
        assert_eq!(
            classify_paragraph("Alice：谢谢", "Org"),
            StyledParagraph::Speaker {
                speaker: "Alice",
                content: "谢谢"
            }
        );
        assert_eq!(
            classify_paragraph("Alice: at 3:00 we opened", "Org"),
            StyledParagraph::Speaker {
                speaker: "Alice",
                content: "at 3:00 we opened"
            }
        );
        assert_eq!(
            classify_paragraph("A closing remark.", "Org"),
            StyledParagraph::Plain("A closing remark.")
        );
        assert_eq!(
            classify_paragraph(": orphan", "Org"),
            StyledParagraph::Plain(": orphan")
        );
    }

    #[test]
    fn test_clock_time_is_not_a_speaker() {
        assert_eq!(
            classify_paragraph("At 3:00 we opened the second shop.", "Org"),
            StyledParagraph::Plain("At 3:00 we opened the second shop.")
        );
        assert_eq!(
            classify_paragraph("Ratio 2:1, see note: below", "Org"),
            StyledParagraph::Speaker {
                speaker: "Ratio 2:1, see note",
                content: "below"
            }
        );
        assert_eq!(
            classify_paragraph("Org：we met at 9:30", "Org"),
            StyledParagraph::Organization {
                speaker: "Org",
                content: "we met at 9:30"
            }
        );
    }

    /// XML of each run in a styled paragraph
    fn run_xml(paragraph: StyledParagraph<'_>) -> Vec<String> {
        styled_paragraph(paragraph)
            .children
            .iter()
            .filter_map(|child| match child {
                ParagraphChild::Run(run) => Some(String::from_utf8(run.build()).unwrap()),
                _ => None,
            })
            .collect()
    }

    fn is_bold(xml: &str) -> bool {
        Regex::new(r"<w:b[\s/>]").unwrap().is_match(xml)
    }

    fn is_accent(xml: &str) -> bool {
        xml.contains(ACCENT_COLOR)
    }

    #[test]
    fn test_organization_runs_bold_and_accent() {
        let runs = run_xml(classify_paragraph("Org: welcome back", "Org"));
        assert_eq!(runs.len(), 2);
        assert!(runs[0].contains("Org："));
        assert!(runs[1].contains("welcome back"));
        for xml in &runs {
            assert!(is_bold(xml), "not bold: {xml}");
            assert!(is_accent(xml), "no accent color: {xml}");
            assert!(xml.contains(FONT));
        }
    }

    #[test]
    fn test_interviewee_speaker_bold_content_plain() {
        let runs = run_xml(classify_paragraph("Alice: we opened in 2009", "Org"));
        assert_eq!(runs.len(), 2);
        assert!(runs[0].contains("Alice："));
        assert!(is_bold(&runs[0]));
        assert!(!is_accent(&runs[0]));
        assert!(runs[1].contains("we opened in 2009"));
        assert!(!is_bold(&runs[1]));
        assert!(!is_accent(&runs[1]));
    }

    #[test]
    fn test_plain_paragraph_unstyled() {
        let runs = run_xml(classify_paragraph("At 3:00 we opened.", "Org"));
        assert_eq!(runs.len(), 1);
        assert!(runs[0].contains("At 3:00 we opened."));
        assert!(!is_bold(&runs[0]));
        assert!(!is_accent(&runs[0]));
        assert!(runs[0].contains(FONT));
    }

    #[test]
    fn test_document_paragraphs() {
        let body = "Org: q\nAlice: a\n\n\nOrg: q2\n";
        assert_eq!(document_paragraphs(body), vec!["Org: q", "Alice: a", "Org: q2"]);
    }

    #[test]
    fn test_write_docx_produces_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interview.docx");

        write_docx("Org: hello\n\nAlice: hi\n\nplain", "Org", &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_write_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interview.txt");
        write_text("Org: hello\n\nAlice: hi", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Org: hello\n\nAlice: hi");
    }

    #[test]
    fn test_report_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let now = Utc::now();
        let report = RunReport {
            run_id: "r1".to_string(),
            started_at: now,
            finished_at: now,
            model: "m".to_string(),
            input_lines: 4,
            turns: 4,
            paired_turns: 2,
            chunks: 1,
            chunks_succeeded: 1,
            chunks_failed: 0,
            failed_chunk_indices: vec![],
            output_path: PathBuf::from("out.txt").display().to_string(),
        };
        report.write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["chunks"], 1);
        assert_eq!(value["run_id"], "r1");
    }
}
