//! Keybinding registry: maps key events to actions, with config overrides.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NavDown,
    NavUp,
    Select,
    Back,
    EnterSearch,
    ExitSearch,
    CommitSearch,
    CycleStatus,
    CycleSpecies,
    CycleGender,
    ToggleFavorite,
    ToggleFavoritesOnly,
    ToggleSort,
    ClearFilters,
    NextPage,
    PrevPage,
    Retry,
    OpenImage,
    CycleTheme,
    ShowHelp,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit application",
            Self::NavDown => "Navigate down",
            Self::NavUp => "Navigate up",
            Self::Select => "Open character",
            Self::Back => "Go back / dismiss",
            Self::EnterSearch => "Search by name",
            Self::ExitSearch => "Cancel search",
            Self::CommitSearch => "Apply search now",
            Self::CycleStatus => "Cycle status filter",
            Self::CycleSpecies => "Cycle species filter",
            Self::CycleGender => "Cycle gender filter",
            Self::ToggleFavorite => "Add / remove favorite",
            Self::ToggleFavoritesOnly => "Show favorites only",
            Self::ToggleSort => "Toggle sort direction",
            Self::ClearFilters => "Clear all filters",
            Self::NextPage => "Next page",
            Self::PrevPage => "Previous page",
            Self::Retry => "Try again",
            Self::OpenImage => "Open image in browser",
            Self::CycleTheme => "Toggle dark mode",
            Self::ShowHelp => "Show help",
        }
    }
}

/// Parse an action name string (from config) into an Action.
fn parse_action_name(name: &str) -> Option<Action> {
    match name.to_lowercase().as_str() {
        "quit" => Some(Action::Quit),
        "nav_down" | "down" => Some(Action::NavDown),
        "nav_up" | "up" => Some(Action::NavUp),
        "select" | "open" => Some(Action::Select),
        "back" => Some(Action::Back),
        "enter_search" | "search" => Some(Action::EnterSearch),
        "exit_search" => Some(Action::ExitSearch),
        "commit_search" => Some(Action::CommitSearch),
        "cycle_status" | "status" => Some(Action::CycleStatus),
        "cycle_species" | "species" => Some(Action::CycleSpecies),
        "cycle_gender" | "gender" => Some(Action::CycleGender),
        "toggle_favorite" | "favorite" => Some(Action::ToggleFavorite),
        "toggle_favorites_only" | "favorites" => Some(Action::ToggleFavoritesOnly),
        "toggle_sort" | "sort" => Some(Action::ToggleSort),
        "clear_filters" | "clear" => Some(Action::ClearFilters),
        "next_page" => Some(Action::NextPage),
        "prev_page" | "previous_page" => Some(Action::PrevPage),
        "retry" => Some(Action::Retry),
        "open_image" | "image" => Some(Action::OpenImage),
        "cycle_theme" | "theme" | "dark_mode" => Some(Action::CycleTheme),
        "show_help" | "help" => Some(Action::ShowHelp),
        _ => None,
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    List,
    Detail,
    Search,
}

impl Context {
    pub fn title(self) -> &'static str {
        match self {
            Self::Global => "Global",
            Self::List => "Character list",
            Self::Detail => "Character detail",
            Self::Search => "Search",
        }
    }
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ch(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

/// Parse a key string from config into a KeySpec.
///
/// Accepts single characters ("q", "/"), named keys ("Enter", "Esc",
/// "Left", "Space"), `Ctrl+<char>` and "F1" through "F12".
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let mut chars = rest.trim().chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeySpec::ctrl(c)),
            _ => None,
        };
    }

    let named = match s.to_lowercase().as_str() {
        "enter" | "return" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "backspace" => Some(KeyCode::Backspace),
        "space" => Some(KeyCode::Char(' ')),
        _ => None,
    };
    if let Some(code) = named {
        return Some(KeySpec::plain(code));
    }

    if let Some(n) = s
        .strip_prefix(['F', 'f'])
        .and_then(|rest| rest.parse::<u8>().ok())
    {
        return (1..=12).contains(&n).then(|| KeySpec::plain(KeyCode::F(n)));
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::ch(c)),
        _ => None,
    }
}

/// Format a KeySpec for the help screen.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

const DEFAULT_BINDINGS: &[(Context, KeySpec, Action)] = &[
    (Context::Global, KeySpec::ch('q'), Action::Quit),
    (Context::Global, KeySpec::ctrl('c'), Action::Quit),
    (Context::Global, KeySpec::ch('j'), Action::NavDown),
    (Context::Global, KeySpec::plain(KeyCode::Down), Action::NavDown),
    (Context::Global, KeySpec::ch('k'), Action::NavUp),
    (Context::Global, KeySpec::plain(KeyCode::Up), Action::NavUp),
    (Context::Global, KeySpec::plain(KeyCode::Esc), Action::Back),
    (Context::Global, KeySpec::ch('f'), Action::ToggleFavorite),
    (Context::Global, KeySpec::ch('r'), Action::Retry),
    (Context::Global, KeySpec::ch('T'), Action::CycleTheme),
    (Context::Global, KeySpec::ch('?'), Action::ShowHelp),
    // List
    (Context::List, KeySpec::plain(KeyCode::Enter), Action::Select),
    (Context::List, KeySpec::ch('/'), Action::EnterSearch),
    (Context::List, KeySpec::ch('s'), Action::CycleStatus),
    (Context::List, KeySpec::ch('e'), Action::CycleSpecies),
    (Context::List, KeySpec::ch('g'), Action::CycleGender),
    (Context::List, KeySpec::ch('F'), Action::ToggleFavoritesOnly),
    (Context::List, KeySpec::ch('o'), Action::ToggleSort),
    (Context::List, KeySpec::ch('c'), Action::ClearFilters),
    (Context::List, KeySpec::ch('n'), Action::NextPage),
    (Context::List, KeySpec::plain(KeyCode::Right), Action::NextPage),
    (Context::List, KeySpec::ch('p'), Action::PrevPage),
    (Context::List, KeySpec::plain(KeyCode::Left), Action::PrevPage),
    // Detail
    (Context::Detail, KeySpec::ch('b'), Action::Back),
    (Context::Detail, KeySpec::plain(KeyCode::Backspace), Action::Back),
    (Context::Detail, KeySpec::plain(KeyCode::Left), Action::Back),
    (Context::Detail, KeySpec::ch('O'), Action::OpenImage),
    // Search
    (Context::Search, KeySpec::plain(KeyCode::Esc), Action::ExitSearch),
    (Context::Search, KeySpec::plain(KeyCode::Enter), Action::CommitSearch),
];

/// Registry of keybindings, supporting default bindings and config overrides.
///
/// The same key can map to different actions in different contexts; lookups
/// fall back to `Context::Global`.
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    /// All bindings in registration order, for the help screen.
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::with_capacity(DEFAULT_BINDINGS.len()),
        };
        for &(context, key, action) in DEFAULT_BINDINGS {
            registry.bind(context, key, action);
        }
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    /// Apply user overrides keyed by action name ("quit", "next_page", ...).
    ///
    /// An override replaces every default key of that action, in every
    /// context the action was bound in. Returns warnings for unknown action
    /// names and unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };
            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let mut contexts: Vec<Context> = self
                .bindings
                .iter()
                .filter(|(_, _, a)| *a == action)
                .map(|(c, _, _)| *c)
                .collect();
            contexts.dedup();

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);

            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(action = %action_name, key = %key_str, "Applied keybinding override");
        }

        warnings
    }

    /// Look up the action for a key, trying `context` first and then Global.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        // Terminals report uppercase letters with SHIFT set; the char
        // already carries the case.
        let modifiers = match code {
            KeyCode::Char(_) => modifiers.difference(KeyModifiers::SHIFT),
            _ => modifiers,
        };
        let key = KeySpec::new(code, modifiers);

        self.lookup.get(&(context, key)).copied().or_else(|| {
            if context == Context::Global {
                None
            } else {
                self.lookup.get(&(Context::Global, key)).copied()
            }
        })
    }

    /// All bindings as (context, key label, description), for the help screen.
    pub fn all_bindings(&self) -> Vec<(Context, String, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), action.describe()))
            .collect()
    }

    /// First key label bound to `action`, used for inline hints.
    pub fn key_label(&self, action: Action) -> Option<String> {
        self.bindings
            .iter()
            .find(|(_, _, a)| *a == action)
            .map(|(_, key, _)| format_key(key))
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(reg: &KeybindingRegistry, c: char, ctx: Context) -> Option<Action> {
        reg.action_for_key(KeyCode::Char(c), KeyModifiers::NONE, ctx)
    }

    #[test]
    fn test_quit_bindings() {
        let reg = KeybindingRegistry::new();
        assert_eq!(key(&reg, 'q', Context::List), Some(Action::Quit));
        assert_eq!(key(&reg, 'q', Context::Detail), Some(Action::Quit));
        assert_eq!(
            reg.action_for_key(KeyCode::Char('c'), KeyModifiers::CONTROL, Context::Search),
            Some(Action::Quit)
        );
    }

    #[test]
    fn test_list_only_bindings() {
        let reg = KeybindingRegistry::new();
        assert_eq!(key(&reg, 's', Context::List), Some(Action::CycleStatus));
        assert_eq!(key(&reg, 'F', Context::List), Some(Action::ToggleFavoritesOnly));
        assert_eq!(key(&reg, 's', Context::Detail), None);
        assert_eq!(key(&reg, 'n', Context::Detail), None);
    }

    #[test]
    fn test_detail_context_overrides_global() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Left, KeyModifiers::NONE, Context::Detail),
            Some(Action::Back)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Left, KeyModifiers::NONE, Context::List),
            Some(Action::PrevPage)
        );
        assert_eq!(key(&reg, 'f', Context::Detail), Some(Action::ToggleFavorite));
    }

    #[test]
    fn test_search_context() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Esc, KeyModifiers::NONE, Context::Search),
            Some(Action::ExitSearch)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Enter, KeyModifiers::NONE, Context::Search),
            Some(Action::CommitSearch)
        );
    }

    #[test]
    fn test_unknown_key_returns_none() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::F(12), KeyModifiers::NONE, Context::Global),
            None
        );
    }

    #[test]
    fn test_shifted_letters_match_plain_bindings() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('F'), KeyModifiers::SHIFT, Context::List),
            Some(Action::ToggleFavoritesOnly)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('T'), KeyModifiers::SHIFT, Context::Detail),
            Some(Action::CycleTheme)
        );
    }

    #[test]
    fn test_override_moves_all_contexts() {
        let mut reg = KeybindingRegistry::new();
        let mut overrides = HashMap::new();
        overrides.insert("next_page".to_string(), "Ctrl+n".to_string());

        assert!(reg.apply_overrides(&overrides).is_empty());
        assert_eq!(key(&reg, 'n', Context::List), None);
        assert_eq!(
            reg.action_for_key(KeyCode::Right, KeyModifiers::NONE, Context::List),
            None
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('n'), KeyModifiers::CONTROL, Context::List),
            Some(Action::NextPage)
        );
    }

    #[test]
    fn test_override_warnings() {
        let mut reg = KeybindingRegistry::new();
        let mut overrides = HashMap::new();
        overrides.insert("teleport".to_string(), "t".to_string());
        overrides.insert("quit".to_string(), "Ctrl+Alt+Q".to_string());

        let mut warnings = reg.apply_overrides(&overrides);
        warnings.sort();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Cannot parse key"));
        assert!(warnings[1].contains("Unknown action"));
        assert_eq!(key(&reg, 'q', Context::List), Some(Action::Quit));
    }

    #[test]
    fn test_parse_key_string() {
        assert_eq!(parse_key_string("Enter"), Some(KeySpec::plain(KeyCode::Enter)));
        assert_eq!(parse_key_string("space"), Some(KeySpec::ch(' ')));
        assert_eq!(parse_key_string("F5"), Some(KeySpec::plain(KeyCode::F(5))));
        assert_eq!(parse_key_string("F13"), None);
        assert_eq!(parse_key_string("f"), Some(KeySpec::ch('f')));
        assert_eq!(parse_key_string("Ctrl+d"), Some(KeySpec::ctrl('d')));
        assert_eq!(parse_key_string("é"), Some(KeySpec::ch('é')));
        assert_eq!(parse_key_string("xyz"), None);
    }

    #[test]
    fn test_format_key_display() {
        assert_eq!(format_key(&KeySpec::ch('q')), "q");
        assert_eq!(format_key(&KeySpec::ch(' ')), "Space");
        assert_eq!(format_key(&KeySpec::ctrl('c')), "Ctrl+c");
        assert_eq!(format_key(&KeySpec::plain(KeyCode::F(5))), "F5");
    }

    #[test]
    fn test_key_label_and_help_listing() {
        let reg = KeybindingRegistry::new();
        assert_eq!(reg.key_label(Action::Retry).as_deref(), Some("r"));
        let all = reg.all_bindings();
        assert_eq!(all.len(), DEFAULT_BINDINGS.len());
        assert!(all
            .iter()
            .any(|(ctx, k, d)| *ctx == Context::Detail && k == "O" && d.contains("image")));
    }
}
