//! Interactive session over one task store
//!
//! Reads one command per line, applies it to the store and prints the
//! refreshed view whenever the store reports a change.

use std::cell::Cell;
use std::io::{BufRead, Write};
use std::rc::Rc;
use std::sync::LazyLock;

use chrono::Local;
use clap::Parser;
use clap::error::ErrorKind;
use regex::Regex;
use tracing::debug;

use taskify_core::date::parse_due_date;
use taskify_core::{NewTask, TaskId, TaskPatch, TaskStore};

use crate::cli::{SessionCommand, SessionLine};
use crate::display::{
    DisplayMode, SharedPalette, Style, format_empty_state, format_summary, format_task,
    format_view_header,
};
use crate::error::{CliError, Result};

// Tag pattern: #word (alphanumeric and underscores)
static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("Invalid tag regex pattern"));

/// Whether the session should keep reading input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    store: TaskStore,
    palette: SharedPalette,
    use_color: bool,
    mode: DisplayMode,
    /// Ids in the order of the last printed list
    last_view: Vec<TaskId>,
    dirty: Rc<Cell<bool>>,
}

impl Session {
    pub fn new(
        mut store: TaskStore,
        palette: SharedPalette,
        use_color: bool,
        mode: DisplayMode,
    ) -> Self {
        let dirty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&dirty);
        store.subscribe(move |event| {
            debug!(?event, "store changed");
            flag.set(true);
        });

        let last_view = store.get_tasks().iter().map(|t| t.id).collect();

        Self {
            store,
            palette,
            use_color,
            mode,
            last_view,
            dirty,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Print the initial list, then process lines until EOF or `quit`
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        self.render(out, self.mode)?;

        let mut lines = input.lines();
        loop {
            write!(out, "taskify> ")?;
            out.flush()?;

            let Some(line) = lines.next() else {
                writeln!(out)?;
                break;
            };
            let line = line.map_err(|e| CliError::io("Failed to read command", e))?;

            match self.handle_line(&line, out) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => writeln!(out, "error: {}", e)?,
            }
        }

        Ok(())
    }

    /// Parse and execute one input line
    pub fn handle_line(&mut self, line: &str, out: &mut dyn Write) -> Result<Flow> {
        let words = split_words(line)?;
        if words.is_empty() {
            return Ok(Flow::Continue);
        }

        let parsed = match SessionLine::try_parse_from(&words) {
            Ok(parsed) => parsed,
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) =>
            {
                write!(out, "{}", e.render())?;
                return Ok(Flow::Continue);
            }
            Err(e) => return Err(e.into()),
        };

        let flow = self.execute(parsed.command, out)?;

        if self.dirty.replace(false) && flow == Flow::Continue {
            self.render(out, self.mode)?;
        }

        Ok(flow)
    }

    fn execute(&mut self, command: SessionCommand, out: &mut dyn Write) -> Result<Flow> {
        let today = Local::now().date_naive();

        match command {
            SessionCommand::Add {
                title,
                priority,
                due,
                description,
                category,
                tag,
            } => {
                let raw_title = title.join(" ");
                let mut tags: Vec<String> = TAG_REGEX
                    .captures_iter(&raw_title)
                    .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
                    .collect();
                tags.extend(tag);
                let clean_title = TAG_REGEX
                    .replace_all(&raw_title, "")
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ");

                let mut input = NewTask::new(clean_title).with_priority(priority.into());
                input.due_date = due.map(|d| parse_due_date(&d, today)).transpose()?;
                input.description = description;
                input.category = category;
                if !tags.is_empty() {
                    input.tags = Some(tags);
                }

                let input = input.normalized()?;
                let title = input.title.clone();
                self.store.add_task(input);
                writeln!(out, "Task added: {}", title)?;
            }

            SessionCommand::Edit {
                position,
                title,
                description,
                priority,
                due,
                category,
                tags,
            } => {
                let id = self.resolve(position)?;

                let mut patch = TaskPatch::new();
                if let Some(title) = title {
                    patch = patch.title(title);
                }
                if let Some(description) = description {
                    patch = patch.description(clearable(description));
                }
                if let Some(priority) = priority {
                    patch = patch.priority(priority.into());
                }
                if let Some(due) = due {
                    let due = match clearable(due) {
                        Some(text) => Some(parse_due_date(&text, today)?),
                        None => None,
                    };
                    patch = patch.due_date(due);
                }
                if let Some(category) = category {
                    patch = patch.category(clearable(category));
                }
                if let Some(tags) = tags {
                    patch = patch.tags(
                        clearable(tags).map(|t| t.split(',').map(str::to_string).collect()),
                    );
                }

                if patch.is_empty() {
                    return Err(CliError::validation(
                        "edit",
                        "Nothing to change. Pass at least one of --title, --description, --priority, --due, --category, --tags",
                    ));
                }

                self.store.update_task(id, patch.normalized()?);
                writeln!(out, "Updated task {}", position)?;
            }

            SessionCommand::Rm { position } => {
                let id = self.resolve(position)?;
                let title = self.title_of(id);
                self.store.delete_task(id);
                writeln!(out, "Removed: {}", title)?;
            }

            SessionCommand::Toggle { position } => {
                let id = self.resolve(position)?;
                self.store.toggle_task(id);
                let status = match self.store.get_task(id) {
                    Some(task) if task.completed => "done",
                    _ => "open",
                };
                writeln!(out, "Marked task {} as {}: {}", position, status, self.title_of(id))?;
            }

            SessionCommand::Move { from, to, raw } => {
                let (source, destination) = if raw {
                    if from >= self.store.len() {
                        return Err(CliError::NoSuchPosition(from));
                    }
                    (from, to)
                } else {
                    let from_id = self.resolve(from)?;
                    let to_id = self.resolve(to)?;
                    let source = self
                        .store
                        .position(from_id)
                        .ok_or(CliError::NoSuchPosition(from))?;
                    let destination = self
                        .store
                        .position(to_id)
                        .ok_or(CliError::NoSuchPosition(to))?;
                    (source, destination)
                };

                self.store.reorder_tasks(source, destination);
                writeln!(out, "Moved task. Use 'sort manual' to list in manual order.")?;
            }

            SessionCommand::Filter { filter } => self.store.set_filter(filter.into()),

            SessionCommand::Sort { sort } => self.store.set_sort_by(sort.into()),

            SessionCommand::Search { query } => self.store.set_search_query(query.join(" ")),

            SessionCommand::Theme { theme } => {
                self.store.set_theme(theme.into());
                writeln!(
                    out,
                    "Theme set to {} (showing {})",
                    self.store.theme(),
                    self.store.applied_theme()
                )?;
            }

            SessionCommand::List { compact, detailed } => {
                let mode = if compact {
                    DisplayMode::Compact
                } else if detailed {
                    DisplayMode::Detailed
                } else {
                    self.mode
                };
                self.render(out, mode)?;
            }

            SessionCommand::Show { position } => {
                let id = self.resolve(position)?;
                if let Some(task) = self.store.get_task(id) {
                    writeln!(
                        out,
                        "{}",
                        format_task(task, position, DisplayMode::Detailed, self.style(), today)
                    )?;
                }
            }

            SessionCommand::Stats => {
                writeln!(out, "{}", format_summary(&self.store.stats(), self.style()))?;
            }

            SessionCommand::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    /// Print the derived view and remember its numbering
    fn render(&mut self, out: &mut dyn Write, mode: DisplayMode) -> Result<()> {
        let today = Local::now().date_naive();
        let style = self.style();
        let tasks = self.store.get_tasks();
        self.last_view = tasks.iter().map(|t| t.id).collect();

        writeln!(out)?;
        writeln!(
            out,
            "{}",
            format_view_header(self.store.view(), tasks.len(), self.store.len(), style)
        )?;

        if tasks.is_empty() {
            writeln!(out, "{}", format_empty_state(self.store.filter()))?;
        } else {
            for (index, task) in tasks.iter().enumerate() {
                writeln!(out, "{}", format_task(task, index + 1, mode, style, today))?;
            }
        }

        writeln!(out, "{}", format_summary(&self.store.stats(), style))?;
        Ok(())
    }

    fn style(&self) -> Style {
        Style::new(self.palette.current(), self.use_color)
    }

    /// Map a 1-based position in the last printed list to a live task id
    fn resolve(&self, position: usize) -> Result<TaskId> {
        position
            .checked_sub(1)
            .and_then(|index| self.last_view.get(index))
            .copied()
            .filter(|id| self.store.get_task(*id).is_some())
            .ok_or(CliError::NoSuchPosition(position))
    }

    fn title_of(&self, id: TaskId) -> String {
        self.store
            .get_task(id)
            .map(|t| t.title.clone())
            .unwrap_or_default()
    }
}

/// `none` (any case) clears an optional field
fn clearable(value: String) -> Option<String> {
    if value.trim().eq_ignore_ascii_case("none") {
        None
    } else {
        Some(value)
    }
}

/// Split a command line into words, honouring single and double quotes
fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err(CliError::parse("Unclosed quote in command"));
    }
    if in_word {
        words.push(current);
    }

    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use taskify_core::theme::{FixedColorScheme, MemoryPreferences};
    use taskify_core::{Priority, ResolvedTheme, SortBy, StatusFilter, Theme};

    fn session() -> Session {
        Session::new(TaskStore::new(), SharedPalette::default(), false, DisplayMode::Default)
    }

    fn run(session: &mut Session, line: &str) -> (Result<Flow>, String) {
        let mut out = Vec::new();
        let result = session.handle_line(line, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_split_words() {
        assert_eq!(
            split_words(r#"add "Pay rent" -C 'home stuff' now"#).unwrap(),
            ["add", "Pay rent", "-C", "home stuff", "now"]
        );
        assert_eq!(split_words("  ").unwrap(), Vec::<String>::new());
        assert_eq!(split_words("search \"\"").unwrap(), ["search", ""]);
        assert!(split_words("add \"oops").is_err());
    }

    #[test]
    fn test_add_extracts_tags_and_renders() {
        let mut s = session();
        let (result, output) = run(&mut s, "add Buy #groceries milk -p low -t dairy");

        assert_eq!(result.unwrap(), Flow::Continue);
        assert!(output.contains("Task added: Buy milk"));
        assert!(output.contains("Showing 1 of 1"));

        let task = &s.store().tasks()[0];
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.tags, Some(vec!["groceries".to_string(), "dairy".to_string()]));
    }

    #[test]
    fn test_add_rejects_tag_only_title() {
        let mut s = session();
        let (result, _) = run(&mut s, "add #urgent #home");
        assert!(matches!(result, Err(CliError::Validation { .. })));
        assert!(s.store().is_empty());
    }

    #[test]
    fn test_priority_scenario_through_commands() {
        let mut s = session();
        run(&mut s, "add Buy milk -p low").0.unwrap();
        run(&mut s, "add Pay rent -p high").0.unwrap();
        run(&mut s, "sort priority").0.unwrap();

        assert_eq!(s.store().sort_by(), SortBy::Priority);
        let titles: Vec<String> = s.store().get_tasks().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, ["Pay rent", "Buy milk"]);
    }

    #[test]
    fn test_positions_follow_last_view() {
        let mut s = session();
        run(&mut s, "add Alpha").0.unwrap();
        run(&mut s, "add Beta").0.unwrap();
        run(&mut s, "sort title").0.unwrap();

        // view is now Alpha, Beta
        run(&mut s, "toggle 1").0.unwrap();
        let alpha = s.store().tasks().iter().find(|t| t.title == "Alpha").unwrap();
        assert!(alpha.completed);

        let (result, _) = run(&mut s, "rm 3");
        assert!(matches!(result, Err(CliError::NoSuchPosition(3))));
        let (result, _) = run(&mut s, "rm 0");
        assert!(matches!(result, Err(CliError::NoSuchPosition(0))));
    }

    #[test]
    fn test_edit_clears_with_none() {
        let mut s = session();
        run(&mut s, "add Report -C work -D draft --due 2030-01-02").0.unwrap();
        run(&mut s, "edit 1 --category none --due none --title 'Final report'").0.unwrap();

        let task = &s.store().tasks()[0];
        assert_eq!(task.title, "Final report");
        assert!(task.category.is_none());
        assert!(task.due_date.is_none());
        assert_eq!(task.description.as_deref(), Some("draft"));

        let (result, _) = run(&mut s, "edit 1");
        assert!(matches!(result, Err(CliError::Validation { .. })));
    }

    #[test]
    fn test_move_uses_view_positions() {
        let mut s = session();
        run(&mut s, "add c").0.unwrap();
        run(&mut s, "add b").0.unwrap();
        run(&mut s, "add a").0.unwrap();
        run(&mut s, "sort manual").0.unwrap();

        // newest first in the raw collection: a, b, c
        run(&mut s, "move 0 2 --raw").0.unwrap();
        let raw: Vec<&str> = s.store().tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(raw, ["b", "c", "a"]);

        // manual view is now b, c, a; move the first onto the third
        run(&mut s, "move 1 3").0.unwrap();
        let raw: Vec<&str> = s.store().tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(raw, ["c", "a", "b"]);

        let (result, _) = run(&mut s, "move 7 0 --raw");
        assert!(matches!(result, Err(CliError::NoSuchPosition(7))));
    }

    #[test]
    fn test_filter_and_search_commands() {
        let mut s = session();
        run(&mut s, "add Call mom").0.unwrap();
        run(&mut s, "filter completed").0.unwrap();
        let (_, output) = run(&mut s, "list");
        assert!(output.contains("No completed tasks yet"));

        run(&mut s, "filter all").0.unwrap();
        run(&mut s, "search MOM").0.unwrap();
        assert_eq!(s.store().filter(), StatusFilter::All);
        assert_eq!(s.store().get_tasks().len(), 1);

        run(&mut s, "search").0.unwrap();
        assert_eq!(s.store().search_query(), "");
    }

    #[test]
    fn test_theme_command_repaints() {
        let palette = SharedPalette::default();
        let store = TaskStore::builder()
            .preferences(MemoryPreferences::new())
            .color_scheme(FixedColorScheme::dark())
            .surface(palette.clone())
            .build();
        let mut s = Session::new(store, palette.clone(), false, DisplayMode::Default);
        assert_eq!(palette.current(), ResolvedTheme::Dark);

        let (_, output) = run(&mut s, "theme light");
        assert!(output.contains("Theme set to light (showing light)"));
        assert_eq!(palette.current(), ResolvedTheme::Light);

        run(&mut s, "theme auto").0.unwrap();
        assert_eq!(s.store().theme(), Theme::Auto);
        assert_eq!(palette.current(), ResolvedTheme::Dark);
    }

    #[test]
    fn test_help_and_unknown() {
        let mut s = session();
        let (result, output) = run(&mut s, "help");
        assert_eq!(result.unwrap(), Flow::Continue);
        assert!(output.contains("add"));

        let (result, _) = run(&mut s, "frobnicate");
        assert!(matches!(result, Err(CliError::Command(_))));
    }

    #[test]
    fn test_run_until_quit() {
        let mut s = session();
        let input = Cursor::new("add First\nbogus\nquit\nadd Never\n");
        let mut out = Vec::new();

        s.run(input, &mut out).unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("error:"));
        assert_eq!(s.store().len(), 1);
    }

    #[test]
    fn test_run_stops_at_eof() {
        let mut s = session();
        let mut out = Vec::new();
        s.run(Cursor::new("add Only\n"), &mut out).unwrap();
        assert_eq!(s.store().len(), 1);
    }
}
