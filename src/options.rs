//! Viewer option vocabulary
//!
//! Maps the names used in the configuration to the integer codes PDF.js
//! expects. Unknown names are not errors: they fall back to the engine's own
//! default.

/// Engine code for "let the engine decide"
pub const UNSPECIFIED: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorTool {
    Select,
    Hand,
}

impl CursorTool {
    pub fn from_name(name: &str) -> Self {
        match name {
            "hand" => CursorTool::Hand,
            _ => CursorTool::Select,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            CursorTool::Select => 0,
            CursorTool::Hand => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    Vertical,
    Horizontal,
    Wrapped,
    Unspecified,
}

impl ScrollMode {
    pub fn from_name(name: &str) -> Self {
        match name {
            "vertical" => ScrollMode::Vertical,
            "horizontal" => ScrollMode::Horizontal,
            "wrapped" => ScrollMode::Wrapped,
            _ => ScrollMode::Unspecified,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            ScrollMode::Vertical => 0,
            ScrollMode::Horizontal => 1,
            ScrollMode::Wrapped => 2,
            ScrollMode::Unspecified => UNSPECIFIED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadMode {
    None,
    Odd,
    Even,
    Unspecified,
}

impl SpreadMode {
    pub fn from_name(name: &str) -> Self {
        match name {
            "none" => SpreadMode::None,
            "odd" => SpreadMode::Odd,
            "even" => SpreadMode::Even,
            _ => SpreadMode::Unspecified,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            SpreadMode::None => 0,
            SpreadMode::Odd => 1,
            SpreadMode::Even => 2,
            SpreadMode::Unspecified => UNSPECIFIED,
        }
    }
}

pub fn cursor_tool_code(name: &str) -> i32 {
    CursorTool::from_name(name).code()
}

pub fn scroll_mode_code(name: &str) -> i32 {
    ScrollMode::from_name(name).code()
}

pub fn spread_mode_code(name: &str) -> i32 {
    SpreadMode::from_name(name).code()
}
