use clap::{Parser, Subcommand};
use colored_json::{Color, ColorMode, Output, Styler, ToColoredJson};
use gpp_codec::sections::us_common::Inconsistency;
use gpp_codec::sections::{Section, SectionId};
use gpp_codec::v1::{ConsentString, GPPString, ParseOptions};
use num_traits::FromPrimitive;
use serde::Serialize;
use std::error::Error;
use std::str::FromStr;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a GPP string and display it in the console
    Parse {
        /// GPP string to parse
        gpp_string: String,
        /// Only decode this section, given by ID or name
        #[arg(short, long, value_parser = parse_section_id)]
        section_id: Option<SectionId>,
        /// Fail on unknown sections and version mismatches instead of skipping them
        #[arg(long, conflicts_with = "section_id")]
        strict: bool,
    },
    /// List all sections
    List {
        /// GPP string to parse
        gpp_string: String,
    },
    /// Build a GPP string holding a single section
    Encode {
        /// Section name, e.g. usnat
        #[arg(value_parser = parse_section_id)]
        section: SectionId,
        /// Field assignments, e.g. SaleOptOut=1 or SensitiveDataProcessing=0,1,2
        fields: Vec<String>,
        /// Include the Global Privacy Control segment with this value
        #[arg(long)]
        gpc: Option<bool>,
    },
    /// Check the notice, opt-out and MSPA fields of the US sections for consistency
    Validate {
        /// GPP string to parse
        gpp_string: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    let e = match args.cmd {
        Commands::Parse {
            gpp_string,
            section_id: None,
            strict,
        } => parse_gpp_string(&gpp_string, strict),
        Commands::Parse {
            gpp_string,
            section_id: Some(id),
            ..
        } => parse_gpp_string_section(&gpp_string, id),
        Commands::List { gpp_string } => list_sections(&gpp_string),
        Commands::Encode {
            section,
            fields,
            gpc,
        } => encode_section(section, &fields, gpc),
        Commands::Validate { gpp_string } => validate(&gpp_string),
    };

    if let Err(e) = e {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn parse_section_id(s: &str) -> Result<SectionId, String> {
    match s.parse::<u16>() {
        Ok(n) => SectionId::from_u16(n).ok_or_else(|| format!("unknown section id {n}")),
        Err(_) => SectionId::from_str(&s.to_lowercase()).map_err(|_| format!("unknown section {s}")),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!(
        "{}",
        serde_json::to_string_pretty(value)?
            .to_colored_json_with_styler(ColorMode::Auto(Output::StdOut), json_color_styler())?
    );
    Ok(())
}

fn parse_gpp_string(s: &str, strict: bool) -> Result<(), Box<dyn Error>> {
    let options = if strict {
        ParseOptions::strict()
    } else {
        ParseOptions::default()
    };
    let parsed = ConsentString::parse_with(s, &options)?;
    debug!(warnings = parsed.warnings.len(), "parsed consent string");

    print_json(&parsed.consent)
}

fn parse_gpp_string_section(s: &str, id: SectionId) -> Result<(), Box<dyn Error>> {
    let gpp_str = GPPString::from_str(s)?;
    let section = gpp_str.decode_section(id)?;

    print_json(&section)
}

fn list_sections(s: &str) -> Result<(), Box<dyn Error>> {
    let gpp_str = GPPString::from_str(s)?;

    for (&id, raw) in gpp_str.section_ids().zip(gpp_str.sections()) {
        println!("{}\t{}\t{}", id as u16, id, raw);
    }
    for (id, raw) in gpp_str.unknown_sections() {
        println!("{}\t?\t{}", id, raw);
    }

    Ok(())
}

fn encode_section(id: SectionId, fields: &[String], gpc: Option<bool>) -> Result<(), Box<dyn Error>> {
    let mut section = Section::from_id(id).ok_or_else(|| format!("unsupported section {id}"))?;

    for assignment in fields {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| format!("expected FIELD=VALUE, got {assignment:?}"))?;
        let spec = section
            .field_spec(name)
            .ok_or_else(|| format!("unknown field {name} in section {id}"))?;
        section.set_field(name, spec.parse_value(value)?)?;
    }

    if gpc.is_some() {
        match &mut section {
            Section::UsNat(s) => s.set_gpc(gpc),
            Section::UsCa(s) => s.set_gpc(gpc),
            Section::UsCo(s) => s.set_gpc(gpc),
            Section::UsCt(s) => s.set_gpc(gpc),
            _ => return Err(format!("section {id} has no gpc segment").into()),
        }
    }

    let mut consent = ConsentString::new();
    consent.insert(section);
    println!("{}", consent.encode());

    Ok(())
}

fn inconsistencies(section: &Section) -> Result<(), Vec<Inconsistency>> {
    match section {
        Section::UsNat(s) => s.validate(),
        Section::UsCa(s) => s.validate(),
        Section::UsVa(s) => s.validate(),
        Section::UsCo(s) => s.validate(),
        Section::UsUt(s) => s.validate(),
        Section::UsCt(s) => s.validate(),
        _ => Ok(()),
    }
}

fn validate(s: &str) -> Result<(), Box<dyn Error>> {
    let consent = ConsentString::from_str(s)?;
    let mut failed = false;

    for section in &consent {
        match inconsistencies(section) {
            Ok(()) => println!("{}\tok", section.id()),
            Err(errors) => {
                failed = true;
                for e in errors {
                    println!(
                        "{}\t{}={} is inconsistent with {}={}",
                        section.id(),
                        e.field1.0,
                        e.field1.1,
                        e.field2.0,
                        e.field2.1
                    );
                }
            }
        }
    }

    if failed {
        Err("inconsistent consent string".into())
    } else {
        Ok(())
    }
}

fn json_color_styler() -> Styler {
    Styler {
        key: Color::Green.foreground(),
        string_value: Color::Blue.bold(),
        integer_value: Color::Magenta.bold(),
        float_value: Color::Magenta.italic(),
        object_brackets: Color::Yellow.bold(),
        array_brackets: Color::Cyan.bold(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("7" => Ok(SectionId::UsNat) ; "numeric")]
    #[test_case("usca" => Ok(SectionId::UsCa) ; "name")]
    #[test_case("UsVa" => Ok(SectionId::UsVa) ; "mixed case")]
    #[test_case("30" => Err("unknown section id 30".to_string()) ; "unknown id")]
    #[test_case("usxx" => Err("unknown section usxx".to_string()) ; "unknown name")]
    fn section_id_argument(s: &str) -> Result<SectionId, String> {
        parse_section_id(s)
    }

    #[test_case(&["parse", "DBABL~BAAAAAAAAQ", "--strict"] => true ; "strict")]
    #[test_case(&["parse", "DBABL~BAAAAAAAAQ", "-s", "usnat"] => true ; "single section")]
    #[test_case(&["parse", "DBABL~BAAAAAAAAQ", "-s", "7", "--strict"] => false ; "strict single section")]
    fn parse_arguments(args: &[&str]) -> bool {
        Cli::try_parse_from(std::iter::once("gpptool").chain(args.iter().copied())).is_ok()
    }
}
