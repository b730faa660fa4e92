use std::io::{self, BufRead};
use std::path::PathBuf;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};

use tsunagari::clock::now_ms;
use tsunagari::{
    browse_puzzles, load_puzzle, DocumentStore, FixedIdentity, GameSession, RunStore, StoreError,
};
use tsunagari_core::catalog::{catalog_entry, puzzle_by_slug, CATALOG, DEMO_PUZZLE_SLUG};
use tsunagari_core::puzzle::Puzzle;
use tsunagari_core::run::RunPhase;

mod bot;
mod store_fs;

use store_fs::{load_or_create_uid, FileDocumentStore, FileLocalStore};

#[derive(Parser)]
#[command(name = "tsunagari-cli", about = "Play word-grouping boards from the terminal")]
struct Cli {
    /// Directory holding boards, runs and the player profile.
    #[arg(long, default_value = ".tsunagari")]
    data_dir: PathBuf,
    /// Skip the profile; the run stays on this machine only.
    #[arg(long)]
    anonymous: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List known boards and saved runs.
    List,
    /// Play a board interactively.
    Play { slug: String },
    /// Let the bot play a board.
    Bot {
        slug: String,
        /// Chance per guess that the bot names a real group.
        #[arg(long, default_value_t = 0.8)]
        skill: f64,
        #[arg(long, default_value_t = 200)]
        max_moves: u32,
        #[arg(long)]
        rng_seed: Option<u64>,
    },
    /// Forget the saved run for a board.
    Reset { slug: String },
}

type CliRunStore = RunStore<Rc<FileDocumentStore>, FileLocalStore, FixedIdentity>;
type CliSession = GameSession<Rc<FileDocumentStore>, FileLocalStore, FixedIdentity>;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let docs = Rc::new(FileDocumentStore::new(&cli.data_dir));
    let identity = if cli.anonymous {
        FixedIdentity::anonymous()
    } else {
        let uid = load_or_create_uid(&cli.data_dir)?;
        FixedIdentity::signed_in(uid.as_str())
    };
    seed_builtin_boards(docs.as_ref()).await?;
    let local = FileLocalStore::new(&cli.data_dir);
    let store = Rc::new(RunStore::new(docs.clone(), local, identity));

    match cli.command {
        Command::List => list_boards(docs.as_ref(), store.as_ref()).await?,
        Command::Play { slug } => {
            let puzzle = load_puzzle(docs.as_ref(), &slug).await?;
            play(GameSession::new(puzzle, "", store)).await?;
        }
        Command::Bot {
            slug,
            skill,
            max_moves,
            rng_seed,
        } => {
            let puzzle = load_puzzle(docs.as_ref(), &slug).await?;
            let mut session = GameSession::new(puzzle, "", store);
            session.hydrate().await;
            let _ = session.board_order();
            let mut rng = match rng_seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let report = bot::run_bot(&mut session, max_moves, skill, &mut rng).await;
            println!(
                "bot finished after {} moves; completed: {}",
                report.moves, report.completed
            );
        }
        Command::Reset { slug } => {
            store.clear(&slug).await;
            println!("cleared run for {slug}");
        }
    }
    Ok(())
}

/// Writes the built-in boards into the document store on first run so the
/// browse and play paths have data to work with.
async fn seed_builtin_boards(docs: &FileDocumentStore) -> Result<(), StoreError> {
    for entry in CATALOG {
        if entry.slug == DEMO_PUZZLE_SLUG {
            continue;
        }
        let path = format!("puzzles/{}", entry.slug);
        if docs.get(&path).await?.is_some() {
            continue;
        }
        let Some(puzzle) = puzzle_by_slug(entry.slug) else {
            continue;
        };
        docs.set(&path, board_doc(&puzzle), false).await?;
    }
    Ok(())
}

fn board_doc(puzzle: &Puzzle) -> Value {
    let categories: Vec<Value> = puzzle
        .categories
        .iter()
        .map(|category| json!({ "title": category.title, "words": category.words }))
        .collect();
    let words_flat: Vec<&str> = puzzle.words.iter().map(|word| word.text.as_str()).collect();
    json!({
        "title": puzzle.title,
        "description": puzzle.description,
        "gridSize": puzzle.grid_count,
        "groupSize": puzzle.group_size,
        "categories": categories,
        "wordsFlat": words_flat,
        "isPublished": true,
        "createdAt": now_ms(),
        "publishedAt": now_ms(),
    })
}

async fn list_boards(docs: &FileDocumentStore, store: &CliRunStore) -> Result<(), StoreError> {
    if let Some(entry) = catalog_entry(DEMO_PUZZLE_SLUG) {
        println!("{:<24} {:<28} built-in demo", entry.slug, entry.title);
    }
    for card in browse_puzzles(docs, 60).await? {
        let status = match store.load(&card.id).await {
            Some(snapshot) => match snapshot.run.phase() {
                RunPhase::Fresh => "fresh".to_string(),
                RunPhase::InProgress => format!("in progress, {} moves", snapshot.run.moves),
                RunPhase::Completed => format!("completed in {} moves", snapshot.run.moves),
            },
            None => "not started".to_string(),
        };
        println!("{:<24} {:<28} {status}", card.id, card.title);
    }
    Ok(())
}

async fn play(mut session: CliSession) -> Result<(), Box<dyn std::error::Error>> {
    session.hydrate().await;
    let mut order = session.board_order();
    println!("{}", session.puzzle().title);
    if !session.puzzle().description.is_empty() {
        println!("{}", session.puzzle().description);
    }
    println!("guess: the numbers of one full group; r resets, q saves and quits");
    print_board(&session, &order);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("q") {
            session.flush().await;
            println!("saved.");
            return Ok(());
        }
        if input.eq_ignore_ascii_case("r") {
            session.reset().await;
            order = session.board_order();
            println!("board reset.");
            print_board(&session, &order);
            continue;
        }
        let Some(guess) = parse_guess(input, &order, session.puzzle().group_size) else {
            println!("enter {} distinct board numbers", session.puzzle().group_size);
            continue;
        };
        session.clear_selection();
        for id in &guess {
            session.select(id);
        }
        let result = session.submit_selection();
        match result {
            tsunagari_core::Evaluation::Match { group_id } => {
                let title = session
                    .puzzle()
                    .category_title(group_id)
                    .unwrap_or("a group");
                println!("correct: {title}");
            }
            tsunagari_core::Evaluation::NoMatch => println!("not a group."),
        }
        if session.run().completed {
            println!(
                "solved {} in {} moves!",
                session.puzzle().title,
                session.run().moves
            );
            session.flush().await;
            return Ok(());
        }
        print_board(&session, &order);
    }
    session.flush().await;
    Ok(())
}

fn parse_guess(input: &str, order: &[String], group_size: usize) -> Option<Vec<String>> {
    let mut guess = Vec::new();
    for token in input.split_whitespace() {
        let number: usize = token.parse().ok()?;
        let id = order.get(number.checked_sub(1)?)?;
        if guess.contains(id) {
            return None;
        }
        guess.push(id.clone());
    }
    (guess.len() == group_size).then_some(guess)
}

fn print_board(session: &CliSession, order: &[String]) {
    let puzzle = session.puzzle();
    let run = session.run();
    for (index, id) in order.iter().enumerate() {
        let text = puzzle.word(id).map(|word| word.text.as_str()).unwrap_or("?");
        let marker = if run.is_found(id) { "*" } else { " " };
        print!("{:>3}{marker}{:<18}", index + 1, text);
        if (index + 1) % puzzle.grid_count == 0 {
            println!();
        }
    }
    if order.len() % puzzle.grid_count != 0 {
        println!();
    }
    for group in &run.found_ids {
        if let Some(first) = group.first() {
            if let Some(word) = puzzle.word(first) {
                if let Some(title) = puzzle.category_title(word.group_id) {
                    println!("found: {title}");
                }
            }
        }
    }
    println!("moves: {}", run.moves);
}
