use gpp_codec::v1::ConsentString;
use std::env::args;

fn main() {
    let s = args()
        .nth(1)
        .unwrap_or_else(|| "DBABzw~1YNN~BAAAAAAAAQ.Y".to_string());

    let parsed = ConsentString::parse(&s).expect("a valid GPP string");
    for warning in &parsed.warnings {
        eprintln!("warning: {warning}");
    }

    #[cfg(feature = "serde")]
    println!(
        "{}",
        serde_json::to_string_pretty(&parsed.consent).expect("serializable sections")
    );
}
