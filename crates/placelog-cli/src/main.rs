//! Placelog CLI - a local-first journal of places, visits and dishes.
//!
//! This is the command-line interface for Placelog. It provides a
//! user-friendly interface to the core library functionality.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};

use placelog_core::{
    CategoryKind, NewAuthor, NewDish, NewList, NewPlace, NewTag, NewVisit, Place, PlacePatch,
    Store, VERSION,
};

/// Placelog - a local-first journal of places, visits and dishes
#[derive(Parser)]
#[command(name = "placelog")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Data directory (defaults to the platform data dir)
    #[arg(short, long, global = true, env = "PLACELOG_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the store (creates tables and the default categories)
    Init,

    /// Manage places
    Place {
        #[command(subcommand)]
        command: PlaceCommands,
    },

    /// Manage lists
    List {
        #[command(subcommand)]
        command: ListCommands,
    },

    /// Manage visits
    Visit {
        #[command(subcommand)]
        command: VisitCommands,
    },

    /// Manage dishes
    Dish {
        #[command(subcommand)]
        command: DishCommands,
    },

    /// Manage tags
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },

    /// Manage categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Manage the owner profile
    Author {
        #[command(subcommand)]
        command: AuthorCommands,
    },
}

#[derive(Subcommand)]
enum PlaceCommands {
    /// Add a new place
    Add {
        /// Place name
        name: String,

        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Street address
        #[arg(long)]
        address: Option<String>,

        /// Category id
        #[arg(long)]
        category: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,

        /// Manual overall rating (switches the place to manual mode)
        #[arg(long)]
        rating: Option<f64>,
    },

    /// List all places
    Ls {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a place by id
    Show {
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rename a place
    Rename { id: String, name: String },

    /// Remove a place and everything referencing it
    Rm { id: String },

    /// Attach a tag to a place
    Tag { id: String, tag_id: String },

    /// Detach a tag from a place
    Untag { id: String, tag_id: String },
}

#[derive(Subcommand)]
enum ListCommands {
    /// Create a new list
    New {
        /// List name
        name: String,

        /// Description
        #[arg(long)]
        description: Option<String>,

        /// City the list covers
        #[arg(long)]
        city: Option<String>,
    },

    /// List all lists
    Ls {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a list and its members
    Show {
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Append a place to a list
    Add { id: String, place_id: String },

    /// Remove a place from a list
    RmPlace { id: String, place_id: String },

    /// Reorder a list's places (pass every member's place id, in order)
    Reorder {
        id: String,

        #[arg(required = true)]
        place_ids: Vec<String>,
    },

    /// Delete a list (members survive)
    Rm { id: String },
}

#[derive(Subcommand)]
enum VisitCommands {
    /// Log a visit to a place
    Log {
        place_id: String,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,

        /// Photo URI
        #[arg(long)]
        photo: Option<String>,
    },

    /// List visits of a place, newest first
    Ls {
        place_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a visit and its dishes
    Rm { id: String },
}

#[derive(Subcommand)]
enum DishCommands {
    /// Add a dish to a visit
    Add {
        visit_id: String,

        /// Dish name
        name: String,

        /// Rating, 1 to 5
        #[arg(long)]
        rating: i64,

        /// Category id
        #[arg(long)]
        category: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// List dishes of a visit
    Ls {
        visit_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a dish
    Rm { id: String },
}

#[derive(Subcommand)]
enum TagCommands {
    /// Create a new tag
    New {
        /// Tag name (unique, ignoring case)
        name: String,

        /// Display color
        #[arg(long)]
        color: Option<String>,
    },

    /// List all tags
    Ls {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a tag, detaching it from every place
    Rm { id: String },
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List categories of one kind
    Ls {
        /// Which kind to list (place or dish)
        #[arg(long, default_value = "place")]
        kind: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum AuthorCommands {
    /// Set (create or replace) the owner profile
    Set {
        display_name: String,

        /// Avatar URI
        #[arg(long)]
        avatar: Option<String>,
    },

    /// Show the owner profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = resolve_data_dir(cli.data_dir.clone())?;

    let Some(command) = cli.command else {
        println!("Placelog v{}", VERSION);
        println!("\nRun `placelog --help` for usage information.");
        return Ok(());
    };

    match command {
        Commands::Init => {
            Store::open(&data_dir)?;
            if !cli.quiet {
                println!("Initialized store at {}", data_dir.display());
            }
        }
        Commands::Place { command } => {
            let store = Store::open(&data_dir)?;
            run_place(&store, command, cli.quiet)?;
        }
        Commands::List { command } => {
            let store = Store::open(&data_dir)?;
            run_list(&store, command, cli.quiet)?;
        }
        Commands::Visit { command } => {
            let store = Store::open(&data_dir)?;
            run_visit(&store, command, cli.quiet)?;
        }
        Commands::Dish { command } => {
            let store = Store::open(&data_dir)?;
            run_dish(&store, command, cli.quiet)?;
        }
        Commands::Tag { command } => {
            let store = Store::open(&data_dir)?;
            run_tag(&store, command, cli.quiet)?;
        }
        Commands::Category { command } => {
            let store = Store::open(&data_dir)?;
            run_category(&store, command)?;
        }
        Commands::Author { command } => {
            let store = Store::open(&data_dir)?;
            run_author(&store, command, cli.quiet)?;
        }
    }

    Ok(())
}

fn run_place(store: &Store, command: PlaceCommands, quiet: bool) -> anyhow::Result<()> {
    match command {
        PlaceCommands::Add {
            name,
            lat,
            lon,
            address,
            category,
            notes,
            rating,
        } => {
            let mut new = NewPlace::new(name, lat, lon);
            if let Some(address) = address {
                new = new.with_address(address);
            }
            if let Some(category) = category {
                new = new.with_category(category);
            }
            if let Some(notes) = notes {
                new = new.with_notes(notes);
            }
            if let Some(rating) = rating {
                new = new.with_manual_rating(rating);
            }
            let place = store.places().create(new)?;
            if !quiet {
                println!("Added place {}", place.id);
            }
        }
        PlaceCommands::Ls { json } => {
            let places = store.places().all()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&places_json(&places))?);
            } else {
                let mut table = new_table(&["ID", "NAME", "RATING", "TAGS"]);
                for place in &places {
                    table.add_row(vec![
                        place.id.clone(),
                        place.name.clone(),
                        format_rating(place.overall_rating),
                        place.tag_ids.len().to_string(),
                    ]);
                }
                println!("{table}");
            }
        }
        PlaceCommands::Show { id, json } => {
            let place = store
                .places()
                .get(&id)?
                .ok_or_else(|| anyhow::anyhow!("Place not found: {}", id))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&place_json(&place))?);
            } else {
                println!("ID: {}", place.id);
                println!("Name: {}", place.name);
                println!("Location: {}, {}", place.latitude, place.longitude);
                if let Some(address) = &place.address {
                    println!("Address: {}", address);
                }
                println!("Rating: {}", format_rating(place.overall_rating));
                if !place.tag_ids.is_empty() {
                    println!("Tags: {}", place.tag_ids.join(", "));
                }
                if let Some(notes) = &place.notes {
                    println!("\n{}", notes);
                }
            }
        }
        PlaceCommands::Rename { id, name } => {
            store.places().update(
                &id,
                PlacePatch {
                    name: Some(name),
                    ..PlacePatch::default()
                },
            )?;
            if !quiet {
                println!("Renamed place {}", id);
            }
        }
        PlaceCommands::Rm { id } => {
            store.places().delete(&id)?;
            if !quiet {
                println!("Removed place {}", id);
            }
        }
        PlaceCommands::Tag { id, tag_id } => {
            store.places().attach_tag(&id, &tag_id)?;
            if !quiet {
                println!("Tagged place {}", id);
            }
        }
        PlaceCommands::Untag { id, tag_id } => {
            store.places().detach_tag(&id, &tag_id)?;
            if !quiet {
                println!("Untagged place {}", id);
            }
        }
    }
    Ok(())
}

fn run_list(store: &Store, command: ListCommands, quiet: bool) -> anyhow::Result<()> {
    match command {
        ListCommands::New {
            name,
            description,
            city,
        } => {
            let mut new = NewList::new(name);
            if let Some(description) = description {
                new = new.with_description(description);
            }
            if let Some(city) = city {
                new = new.with_city(city);
            }
            let list = store.lists().create(new)?;
            if !quiet {
                println!("Created list {}", list.id);
            }
        }
        ListCommands::Ls { json } => {
            let lists = store.lists().all()?;
            if json {
                let values: Vec<serde_json::Value> = lists
                    .iter()
                    .map(|list| {
                        serde_json::json!({
                            "id": list.id,
                            "name": list.name,
                            "city": list.city,
                            "overall_rating": list.overall_rating,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else {
                let mut table = new_table(&["ID", "NAME", "CITY", "RATING"]);
                for list in &lists {
                    table.add_row(vec![
                        list.id.clone(),
                        list.name.clone(),
                        list.city.clone().unwrap_or_default(),
                        format_rating(list.overall_rating),
                    ]);
                }
                println!("{table}");
            }
        }
        ListCommands::Show { id, json } => {
            let list = store
                .lists()
                .get(&id)?
                .ok_or_else(|| anyhow::anyhow!("List not found: {}", id))?;
            let items = store.lists().items(&id)?;
            if json {
                let members: Vec<serde_json::Value> = items
                    .iter()
                    .map(|item| {
                        serde_json::json!({
                            "place_id": item.place_id,
                            "order": item.order,
                        })
                    })
                    .collect();
                let value = serde_json::json!({
                    "id": list.id,
                    "name": list.name,
                    "description": list.description,
                    "city": list.city,
                    "overall_rating": list.overall_rating,
                    "places": members,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("ID: {}", list.id);
                println!("Name: {}", list.name);
                if let Some(description) = &list.description {
                    println!("Description: {}", description);
                }
                println!("Rating: {}", format_rating(list.overall_rating));
                if !items.is_empty() {
                    println!();
                    let mut table = new_table(&["#", "PLACE"]);
                    for item in &items {
                        let name = store
                            .places()
                            .get(&item.place_id)?
                            .map(|p| p.name)
                            .unwrap_or_else(|| item.place_id.clone());
                        table.add_row(vec![item.order.to_string(), name]);
                    }
                    println!("{table}");
                }
            }
        }
        ListCommands::Add { id, place_id } => {
            let item = store.lists().add_place(&id, &place_id)?;
            if !quiet {
                println!("Added place at position {}", item.order);
            }
        }
        ListCommands::RmPlace { id, place_id } => {
            store.lists().remove_place(&id, &place_id)?;
            if !quiet {
                println!("Removed place from list {}", id);
            }
        }
        ListCommands::Reorder { id, place_ids } => {
            store.lists().reorder(&id, &place_ids)?;
            if !quiet {
                println!("Reordered list {}", id);
            }
        }
        ListCommands::Rm { id } => {
            store.lists().delete(&id)?;
            if !quiet {
                println!("Deleted list {}", id);
            }
        }
    }
    Ok(())
}

fn run_visit(store: &Store, command: VisitCommands, quiet: bool) -> anyhow::Result<()> {
    match command {
        VisitCommands::Log {
            place_id,
            notes,
            photo,
        } => {
            let mut new = NewVisit::new(place_id);
            if let Some(notes) = notes {
                new = new.with_notes(notes);
            }
            if let Some(photo) = photo {
                new = new.with_photo(photo);
            }
            let visit = store.visits().create(new)?;
            if !quiet {
                println!("Logged visit {}", visit.id);
            }
        }
        VisitCommands::Ls { place_id, json } => {
            let visits = store.visits().for_place(&place_id)?;
            if json {
                let values: Vec<serde_json::Value> = visits
                    .iter()
                    .map(|visit| {
                        serde_json::json!({
                            "id": visit.id,
                            "notes": visit.notes,
                            "created_at": visit.created_at,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else {
                let mut table = new_table(&["ID", "WHEN", "NOTES"]);
                for visit in &visits {
                    table.add_row(vec![
                        visit.id.clone(),
                        format_timestamp(visit.created_at),
                        visit.notes.clone().unwrap_or_default(),
                    ]);
                }
                println!("{table}");
            }
        }
        VisitCommands::Rm { id } => {
            store.visits().delete(&id)?;
            if !quiet {
                println!("Deleted visit {}", id);
            }
        }
    }
    Ok(())
}

fn run_dish(store: &Store, command: DishCommands, quiet: bool) -> anyhow::Result<()> {
    match command {
        DishCommands::Add {
            visit_id,
            name,
            rating,
            category,
            notes,
        } => {
            let mut new = NewDish::new(visit_id, name, rating);
            if let Some(category) = category {
                new = new.with_category(category);
            }
            if let Some(notes) = notes {
                new = new.with_notes(notes);
            }
            let dish = store.dishes().create(new)?;
            if !quiet {
                println!("Added dish {}", dish.id);
            }
        }
        DishCommands::Ls { visit_id, json } => {
            let dishes = store.dishes().for_visit(&visit_id)?;
            if json {
                let values: Vec<serde_json::Value> = dishes
                    .iter()
                    .map(|dish| {
                        serde_json::json!({
                            "id": dish.id,
                            "name": dish.name,
                            "rating": dish.rating,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else {
                let mut table = new_table(&["ID", "NAME", "RATING"]);
                for dish in &dishes {
                    table.add_row(vec![
                        dish.id.clone(),
                        dish.name.clone(),
                        dish.rating.to_string(),
                    ]);
                }
                println!("{table}");
            }
        }
        DishCommands::Rm { id } => {
            store.dishes().delete(&id)?;
            if !quiet {
                println!("Deleted dish {}", id);
            }
        }
    }
    Ok(())
}

fn run_tag(store: &Store, command: TagCommands, quiet: bool) -> anyhow::Result<()> {
    match command {
        TagCommands::New { name, color } => {
            let mut new = NewTag::new(name);
            if let Some(color) = color {
                new = new.with_color(color);
            }
            let tag = store.tags().create(new)?;
            if !quiet {
                println!("Created tag {}", tag.id);
            }
        }
        TagCommands::Ls { json } => {
            let tags = store.tags().all()?;
            if json {
                let values: Vec<serde_json::Value> = tags
                    .iter()
                    .map(|tag| {
                        serde_json::json!({
                            "id": tag.id,
                            "name": tag.name,
                            "color": tag.color,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else {
                let mut table = new_table(&["ID", "NAME", "COLOR"]);
                for tag in &tags {
                    table.add_row(vec![
                        tag.id.clone(),
                        tag.name.clone(),
                        tag.color.clone().unwrap_or_default(),
                    ]);
                }
                println!("{table}");
            }
        }
        TagCommands::Rm { id } => {
            store.tags().delete(&id)?;
            if !quiet {
                println!("Deleted tag {}", id);
            }
        }
    }
    Ok(())
}

fn run_category(store: &Store, command: CategoryCommands) -> anyhow::Result<()> {
    match command {
        CategoryCommands::Ls { kind, json } => {
            let kind = parse_category_kind(&kind)?;
            let categories = store.categories().list_by_kind(kind)?;
            if json {
                let values: Vec<serde_json::Value> = categories
                    .iter()
                    .map(|category| {
                        serde_json::json!({
                            "id": category.id,
                            "name": category.name,
                            "parent_id": category.parent_id,
                            "order": category.order,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else {
                let mut table = new_table(&["ID", "NAME", "ORDER"]);
                for category in &categories {
                    table.add_row(vec![
                        category.id.clone(),
                        category.name.clone(),
                        category.order.to_string(),
                    ]);
                }
                println!("{table}");
            }
        }
    }
    Ok(())
}

fn run_author(store: &Store, command: AuthorCommands, quiet: bool) -> anyhow::Result<()> {
    match command {
        AuthorCommands::Set {
            display_name,
            avatar,
        } => {
            let mut new = NewAuthor::new(display_name);
            if let Some(avatar) = avatar {
                new = new.with_avatar(avatar);
            }
            let author = store.author().save(new)?;
            if !quiet {
                println!("Saved profile for {}", author.display_name);
            }
        }
        AuthorCommands::Show { json } => {
            let author = store
                .author()
                .get()?
                .ok_or_else(|| anyhow::anyhow!("No profile set. Run `placelog author set`."))?;
            if json {
                let value = serde_json::json!({
                    "id": author.id,
                    "display_name": author.display_name,
                    "avatar_uri": author.avatar_uri,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("Name: {}", author.display_name);
                if let Some(avatar) = &author.avatar_uri {
                    println!("Avatar: {}", avatar);
                }
            }
        }
    }
    Ok(())
}

/// Flag beats env (clap), env beats XDG, XDG beats `~/.local/share`.
fn resolve_data_dir(flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
        if !xdg.is_empty() {
            return Ok(PathBuf::from(xdg).join("placelog"));
        }
    }
    let home = std::env::var_os("HOME")
        .ok_or_else(|| anyhow::anyhow!("Cannot determine data directory: $HOME is not set"))?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("placelog"))
}

fn parse_category_kind(value: &str) -> anyhow::Result<CategoryKind> {
    match value {
        "place" => Ok(CategoryKind::Place),
        "dish" => Ok(CategoryKind::Dish),
        other => Err(anyhow::anyhow!(
            "Unsupported category kind: {} (use place or dish)",
            other
        )),
    }
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(headers.to_vec());
    table
}

fn format_rating(rating: Option<f64>) -> String {
    match rating {
        Some(value) => format!("{:.1}", value),
        None => "-".to_string(),
    }
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn place_json(place: &Place) -> serde_json::Value {
    serde_json::json!({
        "id": place.id,
        "name": place.name,
        "address": place.address,
        "latitude": place.latitude,
        "longitude": place.longitude,
        "category_id": place.category_id,
        "notes": place.notes,
        "overall_rating": place.overall_rating,
        "tag_ids": place.tag_ids,
        "created_at": place.created_at,
        "updated_at": place.updated_at,
    })
}

fn places_json(places: &[Place]) -> Vec<serde_json::Value> {
    places.iter().map(place_json).collect()
}
