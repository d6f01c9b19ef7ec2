use clap::{Parser, Subcommand, ValueEnum};

use taskify_core::{Priority, SortBy, StatusFilter, Theme};

use crate::display::DisplayMode;

#[derive(Parser)]
#[command(name = "taskify")]
#[command(about = "Taskify - stay productive, stay organized.\n\nStarts an interactive session; type 'help' inside it for commands.")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = concat!(
    "v",
    env!("CARGO_PKG_VERSION"),
    "\nCodeName: ",
    env!("CODENAME")
))]
pub struct Cli {
    /// Start with an empty list instead of the example tasks
    #[arg(long)]
    pub no_examples: bool,
    /// Disable colors
    #[arg(long)]
    pub no_color: bool,
    /// List layout (overrides the config file)
    #[arg(long, value_enum, value_name = "MODE")]
    pub display: Option<DisplayMode>,
}

/// One line typed into the session
#[derive(Parser, Debug)]
#[command(name = "taskify", no_binary_name = true, disable_version_flag = true)]
pub struct SessionLine {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FilterArg {
    All,
    Active,
    Completed,
}

impl From<FilterArg> for StatusFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => StatusFilter::All,
            FilterArg::Active => StatusFilter::Active,
            FilterArg::Completed => StatusFilter::Completed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Date,
    Priority,
    Title,
    Manual,
}

impl From<SortArg> for SortBy {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Date => SortBy::Date,
            SortArg::Priority => SortBy::Priority,
            SortArg::Title => SortBy::Title,
            SortArg::Manual => SortBy::Manual,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
    Auto,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Auto => Theme::Auto,
        }
    }
}

/// Positions refer to the numbering of the last printed list, starting at 1
#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Adds a task; #words in the title become tags
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
        /// Task priority
        #[arg(long, short = 'p', value_enum, default_value = "medium")]
        priority: PriorityArg,
        /// Due date (YYYY-MM-DD, tomorrow, friday, in 3 days)
        #[arg(long, short = 'd', value_name = "DATE")]
        due: Option<String>,
        /// Longer description
        #[arg(long, short = 'D', value_name = "TEXT")]
        description: Option<String>,
        /// Category for the task
        #[arg(long, short = 'C', value_name = "CATEGORY")]
        category: Option<String>,
        /// Tags for the task (can be specified multiple times)
        #[arg(long, short = 't', value_name = "TAG")]
        tag: Vec<String>,
    },

    /// Edit a task; use 'none' to clear an optional field
    Edit {
        position: usize,
        /// New title
        #[arg(long, value_name = "TITLE")]
        title: Option<String>,
        /// New description
        #[arg(long, short = 'D', value_name = "TEXT")]
        description: Option<String>,
        /// New priority
        #[arg(long, short = 'p', value_enum)]
        priority: Option<PriorityArg>,
        /// New due date
        #[arg(long, short = 'd', value_name = "DATE")]
        due: Option<String>,
        /// New category
        #[arg(long, short = 'C', value_name = "CATEGORY")]
        category: Option<String>,
        /// Replace tags with a comma-separated list
        #[arg(long, short = 't', value_name = "TAGS")]
        tags: Option<String>,
    },

    /// Removes a task
    #[command(visible_alias = "remove")]
    Rm { position: usize },

    /// Toggles task completion status
    #[command(visible_alias = "check")]
    Toggle { position: usize },

    /// Move a task to the slot of another task in the collection
    Move {
        from: usize,
        to: usize,
        /// Treat both numbers as 0-based positions in the raw collection
        #[arg(long)]
        raw: bool,
    },

    /// Show all, active or completed tasks
    Filter {
        #[arg(value_enum)]
        filter: FilterArg,
    },

    /// Change sort order
    Sort {
        #[arg(value_enum)]
        sort: SortArg,
    },

    /// Search title, description and category; no words clears the search
    Search { query: Vec<String> },

    /// Switch color theme (remembered for the next session)
    Theme {
        #[arg(value_enum)]
        theme: ThemeArg,
    },

    /// Print the current view
    #[command(visible_alias = "ls")]
    List {
        /// Use compact one-line format
        #[arg(long, short = 'c')]
        compact: bool,
        /// Use detailed format with full info
        #[arg(long)]
        detailed: bool,
    },

    /// Show one task in detail
    Show { position: usize },

    /// Collection summary
    Stats,

    /// End the session
    #[command(visible_alias = "exit")]
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(words: &[&str]) -> SessionCommand {
        SessionLine::try_parse_from(words).unwrap().command
    }

    #[test]
    fn test_parse_add() {
        match parse(&["add", "Pay", "rent", "-p", "high", "-t", "bills", "--due", "tomorrow"]) {
            SessionCommand::Add {
                title,
                priority,
                due,
                tag,
                ..
            } => {
                assert_eq!(title, ["Pay", "rent"]);
                assert_eq!(priority, PriorityArg::High);
                assert_eq!(due.as_deref(), Some("tomorrow"));
                assert_eq!(tag, ["bills"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert!(matches!(parse(&["check", "2"]), SessionCommand::Toggle { position: 2 }));
        assert!(matches!(parse(&["ls"]), SessionCommand::List { .. }));
        assert!(matches!(parse(&["exit"]), SessionCommand::Quit));
    }

    #[test]
    fn test_parse_view_commands() {
        assert!(matches!(
            parse(&["filter", "active"]),
            SessionCommand::Filter { filter: FilterArg::Active }
        ));
        assert!(matches!(
            parse(&["sort", "manual"]),
            SessionCommand::Sort { sort: SortArg::Manual }
        ));
        assert!(matches!(
            parse(&["search"]),
            SessionCommand::Search { ref query } if query.is_empty()
        ));
    }

    #[test]
    fn test_rejects_unknown() {
        assert!(SessionLine::try_parse_from(["frobnicate"]).is_err());
        assert!(SessionLine::try_parse_from(["theme", "sepia"]).is_err());
        assert!(SessionLine::try_parse_from(["add"]).is_err());
    }

    #[test]
    fn test_arg_conversions() {
        assert_eq!(Theme::from(ThemeArg::Auto), Theme::Auto);
        assert_eq!(SortBy::from(SortArg::Title), SortBy::Title);
        assert_eq!(StatusFilter::from(FilterArg::Completed), StatusFilter::Completed);
        assert_eq!(Priority::from(PriorityArg::Low), Priority::Low);
    }
}
