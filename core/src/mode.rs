use crate::screen::ScreenFlags;

/// Names that boot the line-oriented interpreter.
const EX_FAMILY: &[&str] = &["ex", "nex", "oex", "obex", "openex"];

/// Names that boot the visual interpreter.
const VI_FAMILY: &[&str] = &["vi", "nvi", "ovi", "obvi", "openvi"];

/// Names that boot the visual interpreter with editing disabled.
const VIEW_FAMILY: &[&str] = &["view", "nview", "oview", "obview", "openview"];

/// True for every name in the ex, vi and view families.
pub fn is_editor_name(name: &str) -> bool {
    [EX_FAMILY, VI_FAMILY, VIEW_FAMILY]
        .iter()
        .any(|family| family.contains(&name))
}

/// Interpreter selected from the invocation name. Fixed for the process once
/// determined; `-e`/`-v` change the screen's mode, not this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Ex,
    Vi,
    /// Vi with `readonly` forced on.
    View,
}

impl EditorMode {
    /// Every name outside the ex and view families selects vi.
    pub fn from_program_name(name: &str) -> Self {
        if EX_FAMILY.contains(&name) {
            EditorMode::Ex
        } else if VIEW_FAMILY.contains(&name) {
            EditorMode::View
        } else {
            EditorMode::Vi
        }
    }

    /// Flag grammar for `name`. Names outside all three families boot vi
    /// but parse their flags with the ex grammar.
    pub fn grammar_for(name: &str) -> Self {
        if VI_FAMILY.contains(&name) {
            EditorMode::Vi
        } else if VIEW_FAMILY.contains(&name) {
            EditorMode::View
        } else {
            EditorMode::Ex
        }
    }

    pub fn is_readonly(self) -> bool {
        matches!(self, EditorMode::View)
    }

    /// Screen mode bit the main loop starts in.
    pub fn screen_mode(self) -> ScreenFlags {
        match self {
            EditorMode::Ex => ScreenFlags::EX,
            EditorMode::Vi | EditorMode::View => ScreenFlags::VI,
        }
    }
}
