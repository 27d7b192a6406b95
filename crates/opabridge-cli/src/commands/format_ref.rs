use opabridge_refs::{RefSegment, format_ref};

pub fn run(segments_json: String) {
    let segments: Vec<RefSegment> = serde_json::from_str(&segments_json).unwrap_or_else(|e| {
        eprintln!("error: invalid segments: {e}");
        std::process::exit(1);
    });

    match format_ref(&segments) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
