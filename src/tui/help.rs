//! Help text content for the help modal

pub fn get_about_help(viewer: bool) -> Vec<String> {
    let summary = if viewer {
        "  Read-only view of a saved field map. Hover a plot for its genotype."
    } else {
        "  Lay out a field trial: select cells, assign a genotype, export the plot list."
    };
    vec!["About Plotmap", summary]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Keybinding help text for the editor or the viewer
pub fn get_help_text(viewer: bool) -> Vec<String> {
    let mut lines = vec![
        "Navigation:",
        "  h/j/k/l      Move left/down/up/right",
        "  Arrow keys   Move cursor",
        "  Mouse        Hover a cell to show its details",
    ];
    if !viewer {
        lines.extend([
            "",
            "Selection:",
            "  Space        Toggle cell",
            "  v            Start/end a keyboard drag",
            "  Click-drag   Select cells (Shift+click toggles)",
            "  Esc          Clear selection",
            "",
            "Assignment:",
            "  a / Enter    Choose genotype for the selection",
            "  j/k          Move in the genotype list",
            "  Enter        Assign as the next plot number",
            "",
            "Map:",
            "  n            New map with the current size (twice if unsaved)",
        ]);
    }
    lines.extend(["", "Other:", "  :            Enter command mode", "  ?            Help", "  q            Quit"]);
    lines.into_iter().map(str::to_string).collect()
}

/// Command help text
pub fn get_commands_help(viewer: bool) -> Vec<String> {
    let mut lines = vec!["Commands", "", "File:"];
    if !viewer {
        lines.extend([
            "  :w [file.json]    Save map",
            "  :wq [file.json]   Save and quit",
            "  :q!               Quit without saving",
            "  :export <file>    Export .xlsx, .csv or .json",
            "  :e! <file.json>   Open map, discarding changes",
        ]);
    }
    lines.extend([
        "  :q                Quit",
        "  :e <file.json>    Open map",
        "  :import <file>    Open map",
        "  :catalog <file>   Load genotypes (.xlsx or .csv)",
    ]);
    if !viewer {
        lines.extend([
            "",
            "Map:",
            "  :new [C R]        New map, optionally C columns x R plants",
            "  :new! [C R]       New map, discarding changes",
            "  :start <n>        Next plot number",
            "  :drag free|column Drag policy",
            "  :group per-cell|grouped",
            "                    Export one row per cell or per plot",
        ]);
    }
    lines.extend(["", "Press Esc or q to close"]);
    lines.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_help_hides_editing() {
        let help = get_commands_help(true);
        assert!(help.iter().any(|l| l.contains(":catalog")));
        assert!(!help.iter().any(|l| l.contains(":export")));
        assert!(!get_help_text(true).iter().any(|l| l.contains("Toggle cell")));
        assert!(get_help_text(false).iter().any(|l| l.contains("Toggle cell")));
    }
}
