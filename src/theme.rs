//! Theme system for the TUI.
//!
//! Semantic color roles map to ratatui `Style` values. `ThemeVariant`
//! picks the Dark or Light palette and `StyleMap` resolves role names to
//! concrete styles.

use ratatui::style::{Color, Modifier, Style};
use std::collections::HashMap;

use crate::api::CharacterStatus;

// ============================================================================
// Theme Variant
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn from_dark_mode(dark: bool) -> Self {
        if dark {
            Self::Dark
        } else {
            Self::Light
        }
    }

    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// ============================================================================
// Color Palette
// ============================================================================

/// Every semantic UI role mapped to a `Style`.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Character list --
    pub character_name: Style,
    pub character_selected: Style,
    pub character_meta: Style,
    pub favorite_marker: Style,

    // -- Status dots --
    pub status_alive: Style,
    pub status_dead: Style,
    pub status_unknown: Style,

    // -- Filter bar --
    pub filter_label: Style,
    pub filter_value: Style,
    pub filter_active: Style,
    pub search_input: Style,

    // -- Pagination --
    pub page_current: Style,
    pub page_other: Style,
    pub page_disabled: Style,

    // -- Detail --
    pub detail_heading: Style,
    pub detail_label: Style,
    pub detail_value: Style,

    // -- Feedback --
    pub error_title: Style,
    pub error_body: Style,
    pub loading: Style,
    pub empty_state: Style,

    // -- Chrome --
    pub status_bar: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
    pub help_key: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            character_name: Style::default().add_modifier(Modifier::BOLD),
            character_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            character_meta: Style::default().fg(Color::Gray),
            favorite_marker: Style::default().fg(Color::Red),

            status_alive: Style::default().fg(Color::Green),
            status_dead: Style::default().fg(Color::Red),
            status_unknown: Style::default().fg(Color::DarkGray),

            filter_label: Style::default().fg(Color::DarkGray),
            filter_value: Style::default(),
            filter_active: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            search_input: Style::default().fg(Color::Yellow),

            page_current: Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            page_other: Style::default(),
            page_disabled: Style::default().fg(Color::DarkGray),

            detail_heading: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            detail_label: Style::default().fg(Color::DarkGray),
            detail_value: Style::default(),

            error_title: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            error_body: Style::default().fg(Color::LightRed),
            loading: Style::default().fg(Color::Yellow),
            empty_state: Style::default().fg(Color::Gray),

            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            panel_border: Style::default(),
            panel_border_focused: Style::default().fg(Color::Cyan),
            help_key: Style::default().fg(Color::Yellow),
        }
    }

    fn light() -> Self {
        Self {
            character_name: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            character_selected: Style::default().bg(Color::Blue).fg(Color::White),
            character_meta: Style::default().fg(Color::DarkGray),
            favorite_marker: Style::default().fg(Color::Magenta),

            status_alive: Style::default().fg(Color::Green),
            status_dead: Style::default().fg(Color::Red),
            status_unknown: Style::default().fg(Color::Gray),

            filter_label: Style::default().fg(Color::DarkGray),
            filter_value: Style::default().fg(Color::Black),
            filter_active: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            search_input: Style::default().fg(Color::Magenta),

            page_current: Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            page_other: Style::default().fg(Color::Black),
            page_disabled: Style::default().fg(Color::Gray),

            detail_heading: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            detail_label: Style::default().fg(Color::DarkGray),
            detail_value: Style::default().fg(Color::Black),

            error_title: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            error_body: Style::default().fg(Color::Red),
            loading: Style::default().fg(Color::Magenta),
            empty_state: Style::default().fg(Color::DarkGray),

            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(Color::Blue),
            help_key: Style::default().fg(Color::Blue),
        }
    }

    /// Style of the status dot for a character.
    pub fn status(&self, status: CharacterStatus) -> Style {
        match status {
            CharacterStatus::Alive => self.status_alive,
            CharacterStatus::Dead => self.status_dead,
            CharacterStatus::Unknown => self.status_unknown,
        }
    }
}

// ============================================================================
// Style Map
// ============================================================================

/// String-keyed style lookup built from a `ColorPalette`.
#[derive(Debug, Clone)]
pub struct StyleMap {
    map: HashMap<&'static str, Style>,
}

const ROLE_COUNT: usize = 25;

const ROLE_NAMES: [&str; ROLE_COUNT] = [
    "character_name",
    "character_selected",
    "character_meta",
    "favorite_marker",
    "status_alive",
    "status_dead",
    "status_unknown",
    "filter_label",
    "filter_value",
    "filter_active",
    "search_input",
    "page_current",
    "page_other",
    "page_disabled",
    "detail_heading",
    "detail_label",
    "detail_value",
    "error_title",
    "error_body",
    "loading",
    "empty_state",
    "status_bar",
    "panel_border",
    "panel_border_focused",
    "help_key",
];

impl StyleMap {
    pub fn from_palette(p: &ColorPalette) -> Self {
        let styles: [Style; ROLE_COUNT] = [
            p.character_name,
            p.character_selected,
            p.character_meta,
            p.favorite_marker,
            p.status_alive,
            p.status_dead,
            p.status_unknown,
            p.filter_label,
            p.filter_value,
            p.filter_active,
            p.search_input,
            p.page_current,
            p.page_other,
            p.page_disabled,
            p.detail_heading,
            p.detail_label,
            p.detail_value,
            p.error_title,
            p.error_body,
            p.loading,
            p.empty_state,
            p.status_bar,
            p.panel_border,
            p.panel_border_focused,
            p.help_key,
        ];

        let map = ROLE_NAMES.iter().copied().zip(styles).collect();
        Self { map }
    }

    /// Resolve a role name. Unknown roles get `Style::default()`.
    pub fn resolve(&self, role: &str) -> Style {
        self.map.get(role).copied().unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
