use crate::disciplines;
use crate::models::{BasicInfo, Gender, PerformanceRecord};
use chrono::NaiveDate;

const CLOSING_INSTRUCTIONS: &str = "Please predict the final places and times of the athletes. \
List the athletes in order of finish with their predicted times (don't just copy their personal best, predict a new time). \
Then, explain why you think they will finish in that order. \
In your reasoning, use the info from the Wikipedia bios and compare athletes with each other using the results, \
and don't be afraid to make harsh judgements based on the data. \
Make reference to specific standout results for the athletes in your reasoning, whether good or bad.";

const MILE_NOTE: &str = "Remember this hypothetical race is a mile, not a 1500m, so the predicted times should be mile times. ";

/// Accumulated text for one athlete
#[derive(Debug, Clone)]
pub struct PromptBlock {
    pub athlete_id: String,
    pub text: String,
}

/// Total characters across all blocks
pub fn total_chars(blocks: &[PromptBlock]) -> usize {
    blocks.iter().map(|b| b.text.chars().count()).sum()
}

/// Event wording: field events are judged on marks, everything else on times.
#[derive(Debug, Clone)]
pub struct EventContext<'a> {
    pub discipline: &'a str,
    pub gender: Gender,
    pub is_field: bool,
}

impl<'a> EventContext<'a> {
    pub fn new(discipline: &'a str, gender: Gender) -> Self {
        Self {
            discipline,
            gender,
            is_field: disciplines::is_field(discipline),
        }
    }

    fn measure(&self) -> &'static str {
        if self.is_field {
            "mark"
        } else {
            "time"
        }
    }
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 12th, 13th, 21st, 111th
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// Full years between January 1st of `event_year` and the birth date,
/// counted in whichever direction is positive.
pub fn age_at(birth_date: NaiveDate, event_year: i32) -> Option<u32> {
    let event_date = NaiveDate::from_ymd_opt(event_year, 1, 1)?;
    if event_date >= birth_date {
        event_date.years_since(birth_date)
    } else {
        birth_date.years_since(event_date)
    }
}

/// The provider shouts family names ("KIPYEGON"); give them ordinary casing.
/// Names that already contain lower-case letters are returned unchanged.
pub fn fix_name_case(name: &str) -> String {
    if name.chars().any(char::is_lowercase) {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len());
    let mut start_of_word = true;
    for ch in name.chars() {
        if start_of_word {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        start_of_word = matches!(ch, ' ' | '-' | '\'' | '’');

        // Mc prefix: "MCLAUGHLIN" -> "McLaughlin"
        if !start_of_word && out.ends_with("Mc") && word_len(&out) == 2 {
            start_of_word = true;
        }
    }
    out
}

fn word_len(s: &str) -> usize {
    s.chars()
        .rev()
        .take_while(|c| !matches!(c, ' ' | '-' | '\'' | '’'))
        .count()
}

pub fn full_name(info: &BasicInfo) -> String {
    format!("{} {}", info.given_name, fix_name_case(&info.family_name))
        .trim()
        .to_string()
}

/// Leading integer of a provider place ("1.", "3", "12h1"), as a rank.
fn numeric_place(place: &str) -> Option<u32> {
    let digits: String = place
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok().filter(|&p| p > 0)
}

/// `"21 JUL 2023: 1st place, time of 3:49.11* (+0.4) in 1500 Metres (indoor) @ Venue"`
pub fn performance_line(record: &PerformanceRecord, event: &EventContext<'_>) -> String {
    let mut line = format!("{}: ", record.date);
    if let Some(place) = record.place.as_deref().and_then(numeric_place) {
        line.push_str(&format!("{} place, ", ordinal(place)));
    }
    line.push_str(&format!("{} of {}", event.measure(), record.mark));
    if record.not_legal {
        line.push('*');
    }
    if let Some(wind) = &record.wind {
        line.push_str(&format!(" ({})", wind));
    }
    line.push_str(&format!(" in {}", record.discipline));
    if record.indoor {
        line.push_str(" (indoor)");
    }
    line.push_str(&format!(" @ {}", record.venue));
    line
}

/// Ranked header plus the athlete's performance list
pub fn athlete_block(
    rank: usize,
    info: &BasicInfo,
    event_year: i32,
    results: &[PerformanceRecord],
    event: &EventContext<'_>,
) -> String {
    let name = full_name(info);
    let age = info
        .birth_date
        .and_then(|birth| age_at(birth, event_year))
        .map(|age| format!("{} years old", age))
        .unwrap_or_else(|| "age unknown".to_string());

    let mut text = format!("{}. {} ({}), {}\n", rank, name, info.country_code, age);
    text.push_str(&format!("Performances by {}:\n", name));
    text.push_str(
        &results
            .iter()
            .map(|r| performance_line(r, event))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    text
}

pub fn biography_section(full_name: &str, extract: &str) -> String {
    format!("\nWikipedia bio for {}:\n{}", full_name, extract)
}

pub fn framing(event: &EventContext<'_>) -> String {
    format!(
        "Write a {} prediction and preview for the {}'s {} in a hypothetical athletics meeting today. \
Assume all athletes are at the ages specified. \
Start your response with a listing of the predicted finish and {}s of the athletes. \
Here are the competitors in no particular order:\n\n",
        if event.is_field { "competition" } else { "race" },
        event.gender,
        event.discipline,
        event.measure(),
    )
}

pub fn closing(event: &EventContext<'_>) -> String {
    let mut text = String::new();
    if disciplines::is_mile(event.discipline) {
        text.push_str(MILE_NOTE);
    }
    if event.is_field {
        text.push_str(&CLOSING_INSTRUCTIONS.replace("time", "mark"));
    } else {
        text.push_str(CLOSING_INSTRUCTIONS);
    }
    text
}

/// Framing, every athlete block, then the closing instructions
pub fn assemble(event: &EventContext<'_>, blocks: &[PromptBlock]) -> String {
    let mut prompt = framing(event);
    prompt.push_str(
        &blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"),
    );
    prompt.push_str("\n\n");
    prompt.push_str(&closing(event));
    prompt
}
