//! Gathering canvas fields from flags, JSON files and the terminal.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Args;

use crate::canvas::{CanvasField, CanvasInput};

/// Canvas sources shared by the commands that take a canvas.
///
/// Fields are layered: the JSON file first, then individual flags. With
/// `--interactive`, or when nothing was given and stdin is a terminal, the
/// remaining blank fields are asked for one by one.
#[derive(Args, Debug, Default, Clone)]
pub struct CanvasArgs {
    /// Canvas JSON file (as written by `export` or `template`).
    #[arg(short = 'f', long = "input")]
    pub input: Option<PathBuf>,

    /// Ask for every blank field on the terminal.
    #[arg(short = 'i', long)]
    pub interactive: bool,

    /// What unique value does the business offer?
    #[arg(long)]
    pub value_proposition: Option<String>,

    /// Who are the target customers?
    #[arg(long)]
    pub customer_profile: Option<String>,

    /// How are customers reached?
    #[arg(long)]
    pub distribution_channel: Option<String>,

    /// How are customer relationships built and kept?
    #[arg(long)]
    pub customer_relationship: Option<String>,

    /// How does the business make money?
    #[arg(long)]
    pub revenue_streams: Option<String>,

    /// What key resources are needed?
    #[arg(long)]
    pub key_resources: Option<String>,

    /// What key activities are performed?
    #[arg(long)]
    pub key_activities: Option<String>,

    /// Who are the key partners?
    #[arg(long)]
    pub key_partners: Option<String>,

    /// What are the main costs?
    #[arg(long)]
    pub cost_structure: Option<String>,
}

impl CanvasArgs {
    fn flag(&self, field: CanvasField) -> Option<&str> {
        let value = match field {
            CanvasField::ValueProposition => &self.value_proposition,
            CanvasField::CustomerProfile => &self.customer_profile,
            CanvasField::DistributionChannel => &self.distribution_channel,
            CanvasField::CustomerRelationship => &self.customer_relationship,
            CanvasField::RevenueStreams => &self.revenue_streams,
            CanvasField::KeyResources => &self.key_resources,
            CanvasField::KeyActivities => &self.key_activities,
            CanvasField::KeyPartners => &self.key_partners,
            CanvasField::CostStructure => &self.cost_structure,
        };
        value.as_deref()
    }

    fn has_any_source(&self) -> bool {
        self.input.is_some() || CanvasField::ALL.iter().any(|f| self.flag(*f).is_some())
    }

    /// Canvas from the file and flags, without prompting.
    pub fn resolve(&self) -> anyhow::Result<CanvasInput> {
        let mut canvas = match &self.input {
            Some(path) => CanvasInput::from_json_file(path)?,
            None => CanvasInput::new(),
        };
        for field in CanvasField::ALL {
            if let Some(value) = self.flag(field) {
                canvas.set(field, value);
            }
        }
        Ok(canvas)
    }

    /// Whether blank fields should be asked for on the terminal.
    pub fn should_prompt(&self, stdin_is_terminal: bool) -> bool {
        self.interactive || (!self.has_any_source() && stdin_is_terminal)
    }
}

/// Resolves the canvas, prompting on the terminal when appropriate.
pub fn collect_canvas(args: &CanvasArgs) -> anyhow::Result<CanvasInput> {
    use std::io::IsTerminal;

    let mut canvas = args.resolve()?;
    if args.should_prompt(io::stdin().is_terminal()) {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        prompt_blank_fields(&mut canvas, &mut stdin.lock(), &mut stdout)?;
    }
    Ok(canvas)
}

/// Asks for every blank field.
///
/// Answers may span several lines and end at the first empty line or end of
/// input.
pub fn prompt_blank_fields(
    canvas: &mut CanvasInput,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(
        out,
        "Describe your business model. Finish each answer with an empty line; \
         leave it empty to skip."
    )?;

    for field in CanvasField::ALL {
        if !canvas.get(field).trim().is_empty() {
            continue;
        }
        writeln!(out, "\n{}", field.question())?;
        writeln!(out, "{}", field.help())?;
        write!(out, "> ")?;
        out.flush()?;

        let answer = read_answer(input)?;
        canvas.set(field, answer);
    }
    Ok(())
}

/// Reads lines up to the first empty one.
pub fn read_answer(input: &mut impl BufRead) -> io::Result<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.trim().is_empty() {
            break;
        }
        lines.push(trimmed.to_string());
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_flags_override_file() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let path = temp_dir.path().join("canvas.json");
        std::fs::write(
            &path,
            r#"{"value_proposition": "From file", "cost_structure": "Rent"}"#,
        )
        .expect("write");

        let args = CanvasArgs {
            input: Some(path),
            value_proposition: Some("From flag".to_string()),
            ..CanvasArgs::default()
        };
        let canvas = args.resolve().expect("resolve");
        assert_eq!(canvas.value_proposition, "From flag");
        assert_eq!(canvas.cost_structure, "Rent");
        assert_eq!(canvas.key_partners, "");
    }

    #[test]
    fn test_prompt_decision() {
        let empty = CanvasArgs::default();
        assert!(empty.should_prompt(true));
        assert!(!empty.should_prompt(false));

        let with_flag = CanvasArgs {
            key_partners: Some("Suppliers".to_string()),
            ..CanvasArgs::default()
        };
        assert!(!with_flag.should_prompt(true));

        let forced = CanvasArgs {
            interactive: true,
            ..with_flag
        };
        assert!(forced.should_prompt(false));
    }

    #[test]
    fn test_read_answer_stops_at_blank_line() {
        let mut input = Cursor::new("Fresh meals\ndelivered daily\n\nnext answer\n");
        assert_eq!(
            read_answer(&mut input).expect("read"),
            "Fresh meals\ndelivered daily"
        );
        assert_eq!(read_answer(&mut input).expect("read"), "next answer");
        assert_eq!(read_answer(&mut input).expect("read"), "");
    }

    #[test]
    fn test_prompt_only_asks_blank_fields() {
        let mut canvas = CanvasInput::new()
            .with(CanvasField::ValueProposition, "Already set")
            .with(CanvasField::CustomerProfile, "Students");

        let answers = "Online shop\n\nSubscription\n\n\n\n\n\n\n";
        let mut input = Cursor::new(answers);
        let mut out = Vec::new();
        prompt_blank_fields(&mut canvas, &mut input, &mut out).expect("prompt");

        assert_eq!(canvas.value_proposition, "Already set");
        assert_eq!(canvas.distribution_channel, "Online shop");
        assert_eq!(canvas.customer_relationship, "Subscription");
        assert_eq!(canvas.cost_structure, "");

        let transcript = String::from_utf8(out).expect("utf8");
        assert!(!transcript.contains(CanvasField::ValueProposition.question()));
        assert!(transcript.contains(CanvasField::DistributionChannel.question()));
        assert!(transcript.contains(CanvasField::CostStructure.question()));
    }
}
