//! Seed collection shown when no persisted or remote data is available.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use crate::models::{sort_newest_first, ImageRef, Record, RecordId};

fn seed_date(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn pretty(value: serde_json::Value) -> String {
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|t| t.to_string()).collect()
}

/// The fixed fallback collection, newest-first.
pub fn seed_records() -> Vec<Record> {
    let mut records = vec![
        Record {
            id: RecordId::from("1"),
            title: "Neon Cyberpunk Samurai".to_string(),
            tags: tags(&["cyberpunk", "neon", "samurai", "cinematic", "tokyo"]),
            body: pretty(json!({
                "subject": "Cyborg Samurai",
                "environment": "Rainy neon Tokyo alley",
                "lighting": "Blue and magenta neon rim lights",
                "style": "Cinematic realism, high contrast",
                "details": ["Wet pavement reflections", "Floating holographic kanji", "Carbon fiber armor"],
                "camera": "85mm lens, f/1.8"
            })),
            image_ref: ImageRef::Url(
                "https://images.unsplash.com/photo-1615873968403-89e068629265?q=80&w=1000&auto=format&fit=crop"
                    .to_string(),
            ),
            author: "Admin".to_string(),
            author_url: Some("https://x.com/google".to_string()),
            created_at: seed_date(20),
        },
        Record {
            id: RecordId::from("2"),
            title: "Ethereal Forest Spirit".to_string(),
            tags: tags(&["fantasy", "ethereal", "nature", "bioluminescent", "dreamy"]),
            body: pretty(json!({
                "creature": "Stag made of starlight",
                "location": "Ancient bioluminescent forest",
                "atmosphere": "Mystical, misty, dreamy",
                "palette": ["Emerald green", "Deep violet", "Cyan"],
                "composition": "Low angle, wide shot",
                "effects": ["Fireflies", "Floating seeds", "Bloom effect"]
            })),
            image_ref: ImageRef::Url(
                "https://images.unsplash.com/photo-1518709268805-4e9042af9f23?q=80&w=1000&auto=format&fit=crop"
                    .to_string(),
            ),
            author: "Admin".to_string(),
            author_url: None,
            created_at: seed_date(21),
        },
        Record {
            id: RecordId::from("3"),
            title: "Architecture: Solar Punk Hub".to_string(),
            tags: tags(&["architecture", "solarpunk", "utopian", "greenery", "future"]),
            body: pretty(json!({
                "building": "Vertical garden skyscraper",
                "era": "Solar Punk future",
                "materials": ["White polished concrete", "Crystal glass", "Vibrant greenery"],
                "weather": "Golden hour sunlight",
                "vibe": "Utopian, clean, peaceful",
                "technical": "Architectural photography, tilt-shift"
            })),
            image_ref: ImageRef::Url(
                "https://images.unsplash.com/photo-1486325212027-8081e485255e?q=80&w=1000&auto=format&fit=crop"
                    .to_string(),
            ),
            author: "Innovator".to_string(),
            author_url: Some("https://twitter.com".to_string()),
            created_at: seed_date(22),
        },
    ];
    sort_newest_first(&mut records);
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_newest_first() {
        let seed = seed_records();
        assert_eq!(seed.len(), 3);
        assert!(seed
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
        assert_eq!(seed[0].id.as_str(), "3");
    }

    #[test]
    fn test_seed_ids_unique() {
        let seed = seed_records();
        let mut ids: Vec<_> = seed.iter().map(|r| r.id.clone()).collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids.dedup();
        assert_eq!(ids.len(), seed.len());
    }

    #[test]
    fn test_seed_bodies_are_valid_json() {
        for record in seed_records() {
            let parsed: serde_json::Value = serde_json::from_str(&record.body).unwrap();
            assert!(parsed.is_object());
            assert!(record.body.contains("\n  \""));
        }
    }
}
