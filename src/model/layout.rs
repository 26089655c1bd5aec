//! Visible-column ordering
//!
//! Every show, hide and reorder produces a fresh descriptor list and ends
//! with a full renumbering pass, so visible columns always carry the order
//! numbers `1..=k` and hidden ones carry 0.

use super::column::ColumnDescriptor;

/// Renumber visible columns to `1..=k`, keeping their relative order.
///
/// Visible columns without a position (order 0) go after the numbered ones,
/// in list order. Hidden columns are reset to 0. List order is unchanged.
pub fn normalize_order(columns: &mut [ColumnDescriptor]) {
    let mut visible: Vec<usize> = (0..columns.len()).filter(|&i| columns[i].visible).collect();
    visible.sort_by_key(|&i| (columns[i].order_number == 0, columns[i].order_number, i));

    for (position, index) in visible.into_iter().enumerate() {
        columns[index].order_number = position as u32 + 1;
    }
    for column in columns.iter_mut().filter(|c| !c.visible) {
        column.order_number = 0;
    }
}

/// Visible columns in display order
pub fn visible_columns(columns: &[ColumnDescriptor]) -> Vec<&ColumnDescriptor> {
    let mut visible: Vec<&ColumnDescriptor> = columns.iter().filter(|c| c.visible).collect();
    visible.sort_by_key(|c| c.order_number);
    visible
}

pub fn visible_count(columns: &[ColumnDescriptor]) -> usize {
    columns.iter().filter(|c| c.visible).count()
}

/// Rebuild the list as the given visible sequence followed by every hidden
/// column, renumbering the visible part from 1.
fn with_visible_sequence(columns: &[ColumnDescriptor], sequence: &[&str]) -> Vec<ColumnDescriptor> {
    let mut result: Vec<ColumnDescriptor> = Vec::with_capacity(columns.len());

    for (position, id) in sequence.iter().enumerate() {
        if let Some(column) = columns.iter().find(|c| c.id == *id) {
            let mut column = column.clone();
            column.visible = true;
            column.order_number = position as u32 + 1;
            result.push(column);
        }
    }
    for column in columns.iter().filter(|c| !sequence.contains(&c.id.as_str())) {
        let mut column = column.clone();
        column.visible = false;
        column.order_number = 0;
        result.push(column);
    }

    result
}

fn visible_ids(columns: &[ColumnDescriptor]) -> Vec<&str> {
    visible_columns(columns).into_iter().map(|c| c.id.as_str()).collect()
}

/// Move a visible column `delta` places within the visible sequence.
///
/// The target position is clamped to the sequence. Returns `None` when the
/// column is not visible or would not move.
pub fn move_column(columns: &[ColumnDescriptor], id: &str, delta: isize) -> Option<Vec<ColumnDescriptor>> {
    let mut sequence = visible_ids(columns);
    let from = sequence.iter().position(|c| *c == id)?;
    let to = (from as isize + delta).clamp(0, sequence.len() as isize - 1) as usize;
    if from == to {
        return None;
    }

    let moved = sequence.remove(from);
    sequence.insert(to, moved);
    Some(with_visible_sequence(columns, &sequence))
}

/// Move a visible column to where another visible column currently sits
pub fn reorder(columns: &[ColumnDescriptor], from_id: &str, to_id: &str) -> Option<Vec<ColumnDescriptor>> {
    let sequence = visible_ids(columns);
    let from = sequence.iter().position(|c| *c == from_id)?;
    let to = sequence.iter().position(|c| *c == to_id)?;
    move_column(columns, from_id, to as isize - from as isize)
}

/// Append a hidden column at the end of the visible sequence
pub fn show_column(columns: &[ColumnDescriptor], id: &str) -> Option<Vec<ColumnDescriptor>> {
    let column = columns.iter().find(|c| c.id == id)?;
    if column.visible {
        return None;
    }

    let next = visible_count(columns) as u32 + 1;
    let mut result = columns.to_vec();
    for column in result.iter_mut().filter(|c| c.id == id) {
        column.visible = true;
        column.order_number = next;
    }
    normalize_order(&mut result);
    Some(result)
}

/// Hide a visible column and close the gap behind it.
///
/// Returns `None` for unknown or already hidden columns and for the last
/// visible column.
pub fn hide_column(columns: &[ColumnDescriptor], id: &str) -> Option<Vec<ColumnDescriptor>> {
    let hidden = columns.iter().find(|c| c.id == id && c.visible)?;
    if visible_count(columns) <= 1 {
        return None;
    }

    let position = hidden.order_number;
    let mut result = columns.to_vec();
    for column in result.iter_mut() {
        if column.id == id {
            column.visible = false;
            column.order_number = 0;
        } else if column.visible && column.order_number > position {
            column.order_number -= 1;
        }
    }
    normalize_order(&mut result);
    Some(result)
}

/// Show or hide depending on the current state
pub fn toggle_column(columns: &[ColumnDescriptor], id: &str) -> Option<Vec<ColumnDescriptor>> {
    let column = columns.iter().find(|c| c.id == id)?;
    if column.visible {
        hide_column(columns, id)
    } else {
        show_column(columns, id)
    }
}

/// Make every column visible; newly shown columns are appended in list order
pub fn show_all(columns: &[ColumnDescriptor]) -> Vec<ColumnDescriptor> {
    let mut sequence = visible_ids(columns);
    sequence.extend(columns.iter().filter(|c| !c.visible).map(|c| c.id.as_str()));
    with_visible_sequence(columns, &sequence)
}

pub fn hide_all(columns: &[ColumnDescriptor]) -> Vec<ColumnDescriptor> {
    with_visible_sequence(columns, &[])
}
