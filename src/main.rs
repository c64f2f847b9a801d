use std::{io::{self, BufRead, Write}, path::{Path, PathBuf}};

use color_eyre::Result;
use foldbuilder::{Config, DeckContext, DeckError, Workspace, request};
use rand::rngs::ThreadRng;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "Options:
- new        create a deck
- clone      copy a deck
- delete     delete a deck
- list       list decks
- view       view a deck
- export     export a deck to a text file
- card       show a card's image link
- add        add cards (\"<name> [count]\", or \"random [count]\")
- adds       add cards listed in a file
- remove     remove cards
- replace    remove cards, then add others
- goldfish   draw an opening hand
- quit";

struct Session {
	workspace: Workspace,
	context:   DeckContext,
	rng:       ThreadRng,
	input:     io::Lines<io::StdinLock<'static>>,
}

impl Session {
	/// Prints `text` and reads one line; `None` at end of input.
	fn prompt(&mut self, text: &str) -> Result<Option<String>> {
		if !text.is_empty() {
			println!("{text}");
		}
		print!("> ");
		io::stdout().flush()?;
		Ok(self.input.next().transpose()?)
	}

	/// Asks for a deck, offering the most recent one as the default.
	fn deck_prompt(&mut self, verb: &str) -> Result<Option<String>> {
		let question = format!("{verb}: ({})", self.context.recent_deck_name());
		let Some(answer) = self.prompt(&question)? else { return Ok(None) };
		let deck = self.context.choose_deck(&answer);
		self.workspace.metadata.save(&self.context)?;
		Ok(Some(deck))
	}

	/// Runs one command; `false` ends the session.
	fn dispatch(&mut self, command: &str) -> Result<bool> {
		match command {
			"help" | "h" => println!("{HELP}"),
			"new deck" | "new" => self.new_deck()?,
			"clone deck" | "clone" => self.clone_deck()?,
			"delete deck" | "delete" => {
				if let Some(deck) = self.deck_prompt("Delete deck")? {
					report(self.workspace.decks.delete_deck(&deck).map(|_| format!("{deck} was deleted")));
				}
			}
			"list decks" | "list" => report(self.workspace.decks.list_decks().map(|decks| decks.join("\n"))),
			"view deck" | "view" => {
				if let Some(deck) = self.deck_prompt("View deck")? {
					report(self.workspace.decks.view_deck(&deck).map(|view| view.to_string()));
				}
			}
			"export deck" | "export" => self.export_deck()?,
			"view card" | "card" => {
				if let Some(name) = self.prompt("Enter card name:")? {
					report(self.workspace.catalog.lookup(name.trim()).map(|card| match card.image_uri("png") {
						Some(uri) => format!("{}: {}", card.name(), uri),
						None => format!("{} has no image", card.name()),
					}));
				}
			}
			"add card" | "add" => self.add_cards()?,
			"add from file" | "adds" => self.add_from_file()?,
			"remove card" | "remove" => {
				self.remove_then(false)?;
			}
			"replace card" | "replace" => {
				if self.remove_then(true)? {
					self.add_cards_to_recent()?;
				}
			}
			"goldfish" => {
				if let Some(deck) = self.deck_prompt("Goldfish with")? {
					report(self.workspace.decks.goldfish(&deck, &mut self.rng).map(|hand| format!("{hand:?}")));
				}
			}
			"quit" | "q" => return Ok(false),
			"" => {}
			_ => println!("Command not recognized. Enter \"help\" for help."),
		}
		Ok(true)
	}

	fn new_deck(&mut self) -> Result<()> {
		let default = self.context.default_deck_name();
		let Some(answer) = self.prompt(&format!("Enter deck name: ({default})"))? else { return Ok(()) };
		let use_default = answer.trim().is_empty();
		let deck = if use_default { default } else { answer.trim().to_string() };

		match self.workspace.decks.create_deck(&deck) {
			Ok(()) => {
				if use_default {
					self.context.increment_default_counter()?;
				}
				println!("{deck} was created");
			}
			Err(e) => report_error(&e),
		}
		self.context.set_recent_deck_name(&deck);
		self.workspace.metadata.save(&self.context)?;
		Ok(())
	}

	fn clone_deck(&mut self) -> Result<()> {
		let Some(source) = self.deck_prompt("Clone from")? else { return Ok(()) };
		let default = format!("new{source}");
		let Some(answer) = self.prompt(&format!("Enter new deck name: ({default})"))? else { return Ok(()) };
		let target = if answer.trim().is_empty() { default } else { answer.trim().to_string() };

		report(self.workspace.decks.clone_deck(&source, &target).map(|n| format!("{target} was created with {n} cards")));
		self.context.set_recent_deck_name(&target);
		self.workspace.metadata.save(&self.context)?;
		Ok(())
	}

	fn export_deck(&mut self) -> Result<()> {
		let Some(deck) = self.deck_prompt("Export deck")? else { return Ok(()) };
		let Some(file) = self.prompt("Export to file:")? else { return Ok(()) };
		report(self.workspace.decks.export_deck(&deck, Path::new(file.trim())).map(|_| format!("Exported {deck}")));
		Ok(())
	}

	fn add_cards(&mut self) -> Result<()> {
		let Some(line) = self.prompt("Enter card name:")? else { return Ok(()) };
		let Some(deck) = self.deck_prompt("Add to")? else { return Ok(()) };
		self.add_request(&line, &deck);
		Ok(())
	}

	fn add_cards_to_recent(&mut self) -> Result<()> {
		let Some(line) = self.prompt("Enter name of card to add:")? else { return Ok(()) };
		let deck = self.context.recent_deck_name().to_string();
		self.add_request(&line, &deck);
		Ok(())
	}

	fn add_request(&mut self, line: &str, deck: &str) {
		let request = request::parse(line.trim());
		let Session { workspace, rng, .. } = self;

		if request.name.eq_ignore_ascii_case("random") {
			report(
				workspace
					.decks
					.add_random(&workspace.catalog, deck, request.quantity, rng)
					.map(|names| format!("Added the following cards:\n{}", names.join("\n"))),
			);
		} else {
			report(
				workspace
					.decks
					.add_cards(&mut workspace.catalog, &request.name, deck, request.quantity)
					.map(|_| format!("Added {}{}", copies(request.quantity), request.name)),
			);
		}
	}

	fn add_from_file(&mut self) -> Result<()> {
		let Some(file) = self.prompt("Enter file name:")? else { return Ok(()) };
		let Some(deck) = self.deck_prompt("Add to")? else { return Ok(()) };
		let workspace = &mut self.workspace;

		match workspace.decks.import_list(&mut workspace.catalog, &PathBuf::from(file.trim()), &deck) {
			Ok(report) => {
				for missing in &report.missing {
					println!("Card {missing} was not found.");
				}
				println!("{} cards added", report.added);
			}
			Err(e) => report_error(&e),
		}
		Ok(())
	}

	/// Removes the requested cards; `true` when all of them were removed.
	fn remove_then(&mut self, replacing: bool) -> Result<bool> {
		let question = if replacing { "Enter name of card to remove:" } else { "Enter card name:" };
		let Some(line) = self.prompt(question)? else { return Ok(false) };
		let Some(deck) = self.deck_prompt("Remove from")? else { return Ok(false) };
		let request = request::parse(line.trim());

		match self.workspace.decks.remove_cards(&request.name, &deck, request.quantity) {
			Ok(()) => {
				println!("Removed {}{}", copies(request.quantity), request.name);
				Ok(true)
			}
			Err(e) => {
				report_error(&e);
				Ok(false)
			}
		}
	}
}

fn copies(quantity: u32) -> String { if quantity > 1 { format!("{quantity}x ") } else { String::new() } }

fn report(result: Result<String, DeckError>) {
	match result {
		Ok(message) => println!("{message}"),
		Err(e) => report_error(&e),
	}
}

fn report_error(e: &DeckError) {
	if e.is_storage_fault() {
		error!("{}", e);
	}
	println!("{e}");
}

fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::registry()
		.with(fmt::layer().with_target(false))
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
		.init();

	let config_path = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("fold.toml"));
	let config = Config::load(&config_path)?;
	let workspace = Workspace::open(&config)?;
	let context = workspace.metadata.load()?;
	info!("Using data directory {:?}", config.data_dir);

	let mut session = Session { workspace, context, rng: rand::thread_rng(), input: io::stdin().lock().lines() };

	println!("Welcome to the MTG Fold!\nEnter \"help\" for help.");
	while let Some(command) = session.prompt("")? {
		if !session.dispatch(command.trim().to_lowercase().as_str())? {
			break;
		}
	}
	Ok(())
}
