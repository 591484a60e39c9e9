use std::io::{BufRead, Write};

use anyhow::Result;

use crate::types::{Answer, AnswerSet};

const DEFAULT_COLOR: &str = "#FFD700";

pub enum QuestionKind {
    Radio(&'static [&'static str]),
    Textarea { placeholder: &'static str },
    ColorText { placeholder: &'static str },
}

pub struct Question {
    pub id: &'static str,
    pub text: &'static str,
    pub kind: QuestionKind,
}

/// The five survey questions, in order.
pub const QUESTIONS: [Question; 5] = [
    Question {
        id: "q1",
        text: "¿Esta emoción se siente más como una reacción del momento o algo que vienes cargando desde antes?",
        kind: QuestionKind::Radio(&[
            "Una reacción del momento",
            "Algo que vengo cargando desde antes",
        ]),
    },
    Question {
        id: "q2",
        text: "Si tu emoción tuviera un color, ¿cuál sería y por qué?",
        kind: QuestionKind::ColorText {
            placeholder: "Describe por qué elegiste ese color...",
        },
    },
    Question {
        id: "q3",
        text: "¿Esta sensación te impulsa a moverte o te invita a detenerte?",
        kind: QuestionKind::Radio(&[
            "Me impulsa a moverme",
            "Me invita a detenerme",
            "Un poco de ambas",
        ]),
    },
    Question {
        id: "q4",
        text: "¿Sientes que esta emoción quiere decirte algo importante? ¿Qué crees que es?",
        kind: QuestionKind::Textarea {
            placeholder: "Escribe lo que sientes que esta emoción te está comunicando...",
        },
    },
    Question {
        id: "q5",
        text: "¿Esta emoción nace por un hecho real o por una interpretación que estás haciendo del momento?",
        kind: QuestionKind::Radio(&[
            "Por un hecho real",
            "Por mi interpretación del momento",
            "Una mezcla de ambos",
        ]),
    },
];

pub struct WizardScreen;

impl WizardScreen {
    /// Walks the visitor through all five questions. Invalid input
    /// re-prompts; the wizard only returns once every answer validates.
    pub fn run(input: &mut impl BufRead, output: &mut impl Write) -> Result<AnswerSet> {
        let mut answers: AnswerSet = Vec::with_capacity(QUESTIONS.len());

        for (i, question) in QUESTIONS.iter().enumerate() {
            writeln!(output)?;
            writeln!(output, "Pregunta {} de {}", i + 1, QUESTIONS.len())?;
            writeln!(output, "{}", question.text)?;

            let answer = match &question.kind {
                QuestionKind::Radio(options) => ask_radio(input, output, options)?,
                QuestionKind::Textarea { placeholder } => {
                    ask_text(input, output, placeholder)?
                }
                QuestionKind::ColorText { placeholder } => {
                    ask_color_text(input, output, placeholder)?
                }
            };

            answers.push((question.id.to_string(), answer));
        }

        Ok(answers)
    }
}

fn read_trimmed(input: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        anyhow::bail!("input stream closed");
    }
    Ok(line.trim().to_string())
}

fn ask_radio(
    input: &mut impl BufRead,
    output: &mut impl Write,
    options: &[&str],
) -> Result<Answer> {
    for (i, option) in options.iter().enumerate() {
        writeln!(output, "  {}) {option}", i + 1)?;
    }

    loop {
        write!(output, "Elige una opción (1-{}): ", options.len())?;
        output.flush()?;
        let line = read_trimmed(input)?;
        match line.parse::<usize>() {
            Ok(choice) if (1..=options.len()).contains(&choice) => {
                return Ok(Answer::Choice(options[choice - 1].to_string()));
            }
            _ => writeln!(output, "Respuesta no válida.")?,
        }
    }
}

fn ask_text(
    input: &mut impl BufRead,
    output: &mut impl Write,
    placeholder: &str,
) -> Result<Answer> {
    writeln!(output, "  ({placeholder})")?;
    loop {
        write!(output, "> ")?;
        output.flush()?;
        let line = read_trimmed(input)?;
        if !line.is_empty() {
            return Ok(Answer::Text(line));
        }
        writeln!(output, "Escribe algo antes de continuar.")?;
    }
}

fn ask_color_text(
    input: &mut impl BufRead,
    output: &mut impl Write,
    placeholder: &str,
) -> Result<Answer> {
    write!(output, "Color (ENTER para {DEFAULT_COLOR}): ")?;
    output.flush()?;
    let raw = read_trimmed(input)?;
    let color = if raw.is_empty() {
        DEFAULT_COLOR.to_string()
    } else {
        raw
    };

    writeln!(output, "  ({placeholder})")?;
    loop {
        write!(output, "> ")?;
        output.flush()?;
        let text = read_trimmed(input)?;
        if !text.is_empty() {
            return Ok(Answer::ColorText {
                color: color.clone(),
                text,
            });
        }
        writeln!(output, "Escribe algo antes de continuar.")?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run_with(script: &str) -> AnswerSet {
        let mut input = Cursor::new(script.to_string());
        let mut output = Vec::new();
        WizardScreen::run(&mut input, &mut output).unwrap()
    }

    #[test]
    fn completes_with_all_five_answers() {
        let answers = run_with("1\n#FF0000\nporque arde\n2\nque pare un poco\n3\n");

        assert_eq!(answers.len(), QUESTIONS.len());
        assert_eq!(answers[0].0, "q1");
        assert_eq!(
            answers[0].1,
            Answer::Choice("Una reacción del momento".to_string())
        );
        assert_eq!(
            answers[1].1,
            Answer::ColorText {
                color: "#FF0000".to_string(),
                text: "porque arde".to_string(),
            }
        );
        assert_eq!(
            answers[4].1,
            Answer::Choice("Una mezcla de ambos".to_string())
        );
    }

    #[test]
    fn invalid_radio_choices_reprompt() {
        let answers = run_with("9\nx\n2\n\nazul\n1\nalgo\n1\n");
        assert_eq!(
            answers[0].1,
            Answer::Choice("Algo que vengo cargando desde antes".to_string())
        );
    }

    #[test]
    fn blank_color_takes_the_default() {
        let answers = run_with("1\n\nbrilla\n1\nalgo\n1\n");
        assert_eq!(
            answers[1].1,
            Answer::ColorText {
                color: DEFAULT_COLOR.to_string(),
                text: "brilla".to_string(),
            }
        );
    }

    #[test]
    fn empty_free_text_reprompts() {
        let answers = run_with("1\n\n\nal fin\n1\n\nya lo dije\n1\n");
        assert_eq!(
            answers[1].1,
            Answer::ColorText {
                color: DEFAULT_COLOR.to_string(),
                text: "al fin".to_string(),
            }
        );
        assert_eq!(answers[3].1, Answer::Text("ya lo dije".to_string()));
    }
}
