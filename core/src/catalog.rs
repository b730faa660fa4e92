use crate::puzzle::Puzzle;

#[derive(Clone, Copy, Debug)]
pub struct CatalogEntry {
    pub slug: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

/// Reserved id served without a store read; the tutorial board.
pub const DEMO_PUZZLE_SLUG: &str = "example";

pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        slug: DEMO_PUZZLE_SLUG,
        title: "Learn the Connections",
        description: "Example demo board",
    },
    CatalogEntry {
        slug: "ball-sports-basics",
        title: "Ball Sports Basics",
        description: "Classic 4x4 warm-up",
    },
    CatalogEntry {
        slug: "sports-mix",
        title: "Sports Mix",
        description: "Step up to 5x5",
    },
];

pub fn catalog_entry(slug: &str) -> Option<&'static CatalogEntry> {
    let trimmed = slug.trim();
    CATALOG
        .iter()
        .find(|entry| entry.slug.eq_ignore_ascii_case(trimmed))
}

pub fn puzzle_by_slug(slug: &str) -> Option<Puzzle> {
    let entry = catalog_entry(slug)?;
    match entry.slug {
        DEMO_PUZZLE_SLUG => demo_puzzle(entry),
        "ball-sports-basics" => ball_sports_basics(entry),
        "sports-mix" => sports_mix(entry),
        _ => None,
    }
}

fn demo_puzzle(entry: &CatalogEntry) -> Option<Puzzle> {
    Puzzle::from_categories(
        entry.slug,
        entry.title,
        entry.description,
        &[
            ("Breakfast Foods", &["Pancakes", "Omelet", "Bagel", "Yogurt"]),
            ("Blue Things", &["Sky", "Jeans", "Sapphire", "Ocean"]),
            ("Dog Breeds", &["Beagle", "Poodle", "Bulldog", "Husky"]),
            ("Computer Parts", &["CPU", "Mouse", "Keyboard", "Monitor"]),
        ],
    )
}

fn ball_sports_basics(entry: &CatalogEntry) -> Option<Puzzle> {
    Puzzle::from_categories(
        entry.slug,
        entry.title,
        entry.description,
        &[
            ("Basketball Terms", &["Dribble", "Rebound", "Assist", "Dunk"]),
            ("Soccer Positions", &["Striker", "Winger", "Keeper", "Fullback"]),
            (
                "Tennis Slams",
                &["Wimbledon", "US Open", "Roland Garros", "Australian Open"],
            ),
            ("Baseball Stats", &["RBI", "ERA", "HR", "AVG"]),
        ],
    )
}

fn sports_mix(entry: &CatalogEntry) -> Option<Puzzle> {
    Puzzle::from_categories(
        entry.slug,
        entry.title,
        entry.description,
        &[
            ("NBA Legends", &["Jordan", "LeBron", "Kobe", "Magic", "Bird"]),
            (
                "Soccer Positions",
                &["Striker", "Winger", "Keeper", "Fullback", "Midfielder"],
            ),
            (
                "Tennis Strokes",
                &["Forehand", "Backhand", "Serve", "Slice", "Dropshot"],
            ),
            (
                "Pitch Types",
                &["Fastball", "Curveball", "Slider", "Changeup", "Knuckleball"],
            ),
            ("Track Distances", &["100m", "200m", "400m", "800m", "1500m"]),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entry_builds_a_valid_board() {
        for entry in CATALOG {
            let puzzle = puzzle_by_slug(entry.slug).expect("catalog board");
            assert_eq!(puzzle.words.len(), puzzle.group_size * puzzle.grid_count);
            assert_eq!(puzzle.categories.len(), puzzle.grid_count);
        }
    }

    #[test]
    fn lookup_trims_and_ignores_case() {
        assert!(puzzle_by_slug("  EXAMPLE ").is_some());
        assert!(puzzle_by_slug("no-such-board").is_none());
    }

    #[test]
    fn sports_mix_is_five_wide() {
        let puzzle = puzzle_by_slug("sports-mix").expect("board");
        assert_eq!(puzzle.grid_count, 5);
        assert_eq!(puzzle.group_size, 5);
        assert_eq!(puzzle.word("E5").map(|w| w.text.as_str()), Some("1500m"));
    }
}
