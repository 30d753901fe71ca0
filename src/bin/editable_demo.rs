use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use editable_collections::{
    AccessorRegistry, ActionCallbacks, EditConfig, EditableSet, Entity, EntityHandle,
    InMemoryRepository, PersistenceActions,
};
use serde_json::{Map, json};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Default, Clone, Entity)]
#[entity(name = "Customer")]
struct Customer {
    #[entity(readonly)]
    id: Uuid,
    first_name: String,
    last_name: String,
    age: i64,
    email: Option<String>,
}

impl Customer {
    fn new(first_name: &str, last_name: &str, age: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            age,
            email: None,
        }
    }
}

#[derive(Parser)]
#[command(name = "editable-demo")]
#[command(about = "Stage edits against a sample customer list and save them")]
struct Cli {
    /// JSON file with editing options
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the sample customers
    Show,
    /// Print the accessor table of the customer type
    Describe,
    /// Stage edits, inserts and deletes, then save or undo them
    Edit {
        /// INDEX:PROPERTY=VALUE, e.g. 0:age=30
        #[arg(long = "set")]
        sets: Vec<String>,
        /// Index of a customer to delete
        #[arg(long = "delete")]
        deletes: Vec<usize>,
        /// PROPERTY=VALUE[,PROPERTY=VALUE...] for a new customer
        #[arg(long = "add")]
        adds: Vec<String>,
        /// Discard staged work instead of saving it
        #[arg(long)]
        undo: bool,
        /// Report what a save would route without touching the repository
        #[arg(long, conflicts_with = "undo")]
        dry_run: bool,
    },
    /// Print the effective editing options
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Show => {
            let repository = sample_repository();
            print_json(&repository_json(&repository)?)
        }
        Command::Describe => describe(),
        Command::Edit {
            sets,
            deletes,
            adds,
            undo,
            dry_run,
        } => {
            let outcome = if undo {
                Outcome::Undo
            } else if dry_run {
                Outcome::DryRun
            } else {
                Outcome::Save
            };
            edit(config, &sets, &deletes, &adds, outcome)
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

#[derive(Clone, Copy)]
enum Outcome {
    Save,
    DryRun,
    Undo,
}

fn load_config(path: Option<&PathBuf>) -> Result<EditConfig> {
    match path {
        Some(path) => EditConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config '{}'", path.display())),
        None => Ok(EditConfig::default()),
    }
}

fn sample_repository() -> InMemoryRepository<Customer> {
    InMemoryRepository::from_entities(vec![
        Customer::new("Angela", "Adams", 29),
        Customer::new("Benny", "Bernanke", 34),
        Customer::new("Charlie", "Chaplin", 19),
        Customer::new("Darryl", "Donkey Kong", 11),
        Customer::new("Edgar", "Eucalyptus", 20),
    ])
}

fn describe() -> Result<()> {
    let table = AccessorRegistry::shared().table::<Customer>()?;
    println!("{} ({} properties)", table.type_name(), table.len());
    for descriptor in table.descriptors() {
        println!("  {}", descriptor);
    }
    Ok(())
}

fn edit(
    config: EditConfig,
    sets: &[String],
    deletes: &[usize],
    adds: &[String],
    outcome: Outcome,
) -> Result<()> {
    let mut repository = sample_repository();
    let registry = AccessorRegistry::shared();
    let mut set =
        EditableSet::with_registry(repository.items().iter().cloned(), &registry, config)?;

    let source_ids = set.all_items().iter().map(|item| item.id()).collect::<Vec<_>>();
    let id_at = |index: usize| {
        source_ids
            .get(index)
            .copied()
            .ok_or_else(|| anyhow!("No customer at index {}", index))
    };

    for assignment in sets {
        let (index, rest) = assignment
            .split_once(':')
            .ok_or_else(|| anyhow!("Expected INDEX:PROPERTY=VALUE, got '{}'", assignment))?;
        let index = index
            .trim()
            .parse::<usize>()
            .with_context(|| format!("Invalid index in '{}'", assignment))?;
        let item = set.item_mut(id_at(index)?)?;
        for (name, raw) in parse_assignments(rest)? {
            let property = item
                .property(name)
                .cloned()
                .ok_or_else(|| anyhow!("Unknown property '{}'", name))?;
            item.write(&property, property.data_type().parse_value(raw)?)?;
        }
    }

    for fields in adds {
        let id = set.add_new_item(Customer {
            id: Uuid::new_v4(),
            ..Customer::default()
        });
        let item = set.item_mut(id)?;
        for (name, raw) in parse_assignments(fields)? {
            let property = item
                .property(name)
                .cloned()
                .ok_or_else(|| anyhow!("Unknown property '{}'", name))?;
            item.write(&property, property.data_type().parse_value(raw)?)?;
        }
    }

    for index in deletes {
        set.delete_item(id_at(*index)?)?;
    }

    println!("Staged:");
    for item in set.all_items() {
        let first_name = item.read_uncommitted("first_name")?.to_string();
        println!("  {:<12} {:<20} {}", item.id(), first_name, item.state());
        for (descriptor, value) in item.pending_changes() {
            println!("      {} -> {}", descriptor.name(), value);
        }
    }

    match outcome {
        Outcome::Undo => {
            set.undo_changes();
            println!("Undone, nothing saved");
        }
        Outcome::DryRun => {
            let mut actions = ActionCallbacks::new()
                .on_edit(|entity: &EntityHandle<Customer>| {
                    println!("  would edit {}", entity.borrow().first_name)
                })
                .on_add(|entity: &EntityHandle<Customer>| {
                    println!("  would add {}", entity.borrow().first_name)
                })
                .on_delete(|entity: &EntityHandle<Customer>| {
                    println!("  would delete {}", entity.borrow().first_name)
                });
            let changes = set.save(&mut actions)?;
            println!(
                "Dry run: {} change(s) committed, repository rows unchanged",
                changes.total()
            );
        }
        Outcome::Save => {
            let mut log = Vec::new();
            let changes = {
                let mut actions = LoggingActions {
                    inner: &mut repository,
                    log: &mut log,
                };
                set.save(&mut actions)?
            };
            for line in &log {
                println!("  {}", line);
            }
            println!(
                "Saved: {} edited, {} added, {} deleted",
                changes.edited, changes.added, changes.deleted
            );
        }
    }

    print_json(&repository_json(&repository)?)
}

/// Forwards to the repository while recording each routed entity.
struct LoggingActions<'a> {
    inner: &'a mut InMemoryRepository<Customer>,
    log: &'a mut Vec<String>,
}

impl LoggingActions<'_> {
    fn record(&mut self, action: &str, entity: &EntityHandle<Customer>) {
        let customer = entity.borrow();
        self.log.push(format!(
            "{} {} {}",
            action, customer.first_name, customer.last_name
        ));
    }
}

impl PersistenceActions<Customer> for LoggingActions<'_> {
    fn on_edit(&mut self, entity: &EntityHandle<Customer>) {
        self.record("edit", entity);
        self.inner.on_edit(entity);
    }

    fn on_add(&mut self, entity: &EntityHandle<Customer>) {
        self.record("add", entity);
        self.inner.on_add(entity);
    }

    fn on_delete(&mut self, entity: &EntityHandle<Customer>) {
        self.record("delete", entity);
        self.inner.on_delete(entity);
    }
}

fn parse_assignments(input: &str) -> Result<Vec<(&str, &str)>> {
    input
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            part.split_once('=')
                .map(|(name, value)| (name.trim(), value))
                .ok_or_else(|| anyhow!("Expected PROPERTY=VALUE, got '{}'", part))
        })
        .collect()
}

fn repository_json(repository: &InMemoryRepository<Customer>) -> Result<serde_json::Value> {
    let table = AccessorRegistry::shared().table::<Customer>()?;
    let rows = repository
        .items()
        .iter()
        .map(|handle| {
            let customer = handle.borrow();
            let mut row = Map::new();
            for entry in table.entries() {
                row.insert(
                    entry.descriptor().name().to_string(),
                    entry.get(&customer).to_json(),
                );
            }
            serde_json::Value::Object(row)
        })
        .collect::<Vec<_>>();
    Ok(json!({ "type": Customer::type_name(), "customers": rows }))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
