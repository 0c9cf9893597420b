//! Full-screen list picker with fuzzy filtering.

use std::fmt::Display;
use std::io::{stdout, Write};
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::style::Color::{DarkBlue, DarkGreen, Reset, Yellow};
use crossterm::style::{Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{cursor, event, execute, queue, terminal, ExecutableCommand};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use ilc_core::error::Result;

use super::types::{CycleDirection, KeyAction, PickerEntry, UiState, ViewportState};

struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = stdout();
        let _ = stdout.execute(DisableMouseCapture);
        let _ = stdout.execute(LeaveAlternateScreen);
    }
}

/// Lets the user pick one of `entries`, returning its position.
///
/// Returns `Ok(None)` when the user quits, or when there is nothing to pick.
///
/// # Errors
///
/// Returns an error if the terminal can't be driven.
pub fn pick(title: &str, entries: &[PickerEntry]) -> Result<Option<usize>> {
    if entries.is_empty() {
        return Ok(None);
    }

    let mut stdout = stdout();
    stdout.execute(EnterAlternateScreen)?;
    enable_raw_mode()?;

    let _raw_mode_guard = RawModeGuard; // Restores the terminal on every return path
    stdout.execute(EnableMouseCapture)?;

    let (width, height) = terminal::size()?;
    let mut ui_state = UiState::new(width, height);
    let mut visible = filter_entries(entries, &ui_state.filter_text);
    redraw_ui(title, &ui_state, &visible, entries)?;

    let mut down_row: Option<u16> = None;

    loop {
        if !event::poll(Duration::from_millis(500))? {
            continue;
        }

        let mut new_ui_state = None;

        match event::read()? {
            Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                match handle_key_event(key_event, &ui_state, &visible) {
                    KeyAction::Pick(position) => return Ok(Some(position)),
                    KeyAction::Cancel => return Ok(None),
                    KeyAction::Update(state) => new_ui_state = Some(state),
                    KeyAction::Move(direction) => {
                        new_ui_state = Some(move_selected_index(&ui_state, visible.len(), direction));
                    }
                    KeyAction::Bell => execute!(stdout, Print("\x07"))?,
                    KeyAction::Ignore => {}
                }
            }
            Event::Mouse(MouseEvent {
                kind,
                row,
                modifiers,
                ..
            }) if modifiers == KeyModifiers::NONE => match kind {
                MouseEventKind::Down(MouseButton::Left) => down_row = Some(row),
                MouseEventKind::Up(MouseButton::Left) => {
                    if let Some(position) = down_row
                        .take()
                        .filter(|down| *down == row)
                        .and_then(|row| clicked_entry(row, &ui_state, &visible))
                    {
                        return Ok(Some(position));
                    }
                }
                MouseEventKind::ScrollDown => {
                    new_ui_state = Some(move_selected_index(&ui_state, visible.len(), CycleDirection::Down));
                }
                MouseEventKind::ScrollUp => {
                    new_ui_state = Some(move_selected_index(&ui_state, visible.len(), CycleDirection::Up));
                }
                _ => {}
            },
            Event::Resize(width, height) => {
                new_ui_state = Some(handle_resize(width, height, &ui_state, visible.len()));
            }
            _ => {}
        }

        if let Some(state) = new_ui_state.filter(|state| *state != ui_state) {
            if state.filter_text != ui_state.filter_text {
                visible = filter_entries(entries, &state.filter_text);
            }
            ui_state = state;
            redraw_ui(title, &ui_state, &visible, entries)?;
        }
    }
}

/// Maps a key press to what the picker should do next.
///
/// `visible` holds the positions of the entries left after filtering.
#[must_use]
pub fn handle_key_event(key_event: KeyEvent, ui_state: &UiState, visible: &[usize]) -> KeyAction {
    match key_event.code {
        KeyCode::Up => KeyAction::Move(CycleDirection::Up),
        KeyCode::Down => KeyAction::Move(CycleDirection::Down),
        KeyCode::Enter => visible
            .get(ui_state.selected_index)
            .map_or(KeyAction::Bell, |position| KeyAction::Pick(*position)),
        KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Cancel,
        KeyCode::Backspace if ui_state.is_filtering => {
            let mut updated_state = ui_state.clone();
            if updated_state.filter_text.pop().is_none() {
                updated_state.is_filtering = false;
            }
            KeyAction::Update(reset_selection(updated_state))
        }
        KeyCode::Char(c) if ui_state.is_filtering => {
            let mut updated_state = ui_state.clone();
            updated_state.filter_text.push(c);
            KeyAction::Update(reset_selection(updated_state))
        }
        KeyCode::Esc if ui_state.is_filtering => {
            let mut updated_state = ui_state.clone();
            updated_state.is_filtering = false;
            updated_state.filter_text.clear();
            KeyAction::Update(reset_selection(updated_state))
        }
        KeyCode::Char('/') => {
            let mut updated_state = ui_state.clone();
            updated_state.is_filtering = true;
            KeyAction::Update(updated_state)
        }
        KeyCode::Char('k') => KeyAction::Move(CycleDirection::Up),
        KeyCode::Char('j') => KeyAction::Move(CycleDirection::Down),
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Cancel,
        _ => KeyAction::Ignore,
    }
}

fn reset_selection(mut ui_state: UiState) -> UiState {
    ui_state.selected_index = 0;
    ui_state.viewport.offset = 0;
    ui_state
}

/// Entry position under a clicked screen row, if any.
#[must_use]
pub fn clicked_entry(row: u16, ui_state: &UiState, visible: &[usize]) -> Option<usize> {
    if row == 0 {
        // Header
        return None;
    }

    let index = (row - 1) as usize + ui_state.viewport.offset;
    if index >= ui_state.viewport.offset + ui_state.viewport.height as usize {
        return None;
    }

    visible.get(index).copied()
}

/// Handle window resize events
#[must_use]
pub fn handle_resize(width: u16, height: u16, ui_state: &UiState, visible_count: usize) -> UiState {
    let new_height = height.saturating_sub(2);
    let mut ui_state = ui_state.clone();
    let mut new_viewport = ViewportState {
        width,
        height: new_height,
        offset: ui_state.viewport.offset,
    };

    match new_height.cmp(&ui_state.viewport.height) {
        // Growing taller shows more entries above the selection
        std::cmp::Ordering::Greater if new_viewport.offset > 0 => {
            let height_increase = new_height - ui_state.viewport.height;
            new_viewport.offset = new_viewport.offset.saturating_sub(height_increase as usize);
        }
        std::cmp::Ordering::Less
            if ui_state.selected_index >= new_viewport.offset + new_height as usize =>
        {
            new_viewport.offset = ui_state
                .selected_index
                .saturating_sub((new_height as usize).saturating_sub(1));

            if new_viewport.offset + new_height as usize > visible_count {
                new_viewport.offset = visible_count.saturating_sub(new_height as usize);
            }
        }
        _ => {}
    }

    ui_state.viewport = new_viewport;
    ui_state
}

/// Move the selected index in the given direction, wrapping at either end.
#[must_use]
pub fn move_selected_index(
    ui_state: &UiState,
    visible_count: usize,
    direction: CycleDirection,
) -> UiState {
    if visible_count == 0 {
        return ui_state.clone();
    }

    let mut ui_state = ui_state.clone();
    let height = (ui_state.viewport.height as usize).max(1);
    let current = ui_state.selected_index;

    let new_index = match direction {
        CycleDirection::Up if current == 0 => {
            let last = visible_count - 1;
            ui_state.viewport.offset = last.saturating_sub(height - 1);
            last
        }
        CycleDirection::Up => {
            let previous = current - 1;
            if previous < ui_state.viewport.offset {
                ui_state.viewport.offset = previous;
            }
            previous
        }
        CycleDirection::Down => {
            let next = (current + 1) % visible_count;
            if next < current {
                ui_state.viewport.offset = 0;
            } else if next >= ui_state.viewport.offset + height {
                ui_state.viewport.offset = next + 1 - height;
            }
            next
        }
    };

    ui_state.selected_index = new_index;
    ui_state
}

/// Positions of the entries matching `predicate`, in list order.
///
/// A numeric predicate matches entry numbers; anything else is matched fuzzily
/// against the displayed text.
#[must_use]
pub fn filter_entries(entries: &[PickerEntry], predicate: &str) -> Vec<usize> {
    if predicate.is_empty() {
        return (0..entries.len()).collect();
    }

    let matcher = SkimMatcherV2::default();
    let by_number = predicate.parse::<usize>().is_ok();

    entries
        .iter()
        .enumerate()
        .filter(|(position, entry)| {
            if by_number {
                (position + 1).to_string().contains(predicate)
            } else {
                matcher.fuzzy_match(&entry.to_string(), predicate).is_some()
            }
        })
        .map(|(position, _)| position)
        .collect()
}

fn redraw_ui(
    title: &str,
    ui_state: &UiState,
    visible: &[usize],
    entries: &[PickerEntry],
) -> Result<()> {
    let mut stdout = stdout();

    queue!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;

    print_header(title, ui_state, visible.len())?;

    if visible.is_empty() {
        queue!(
            stdout,
            MoveTo(0, 1),
            SetForegroundColor(Color::Red),
            Print("No matches!".to_string()),
            SetAttribute(Attribute::Reset),
            cursor::MoveToNextLine(1)
        )?;
    } else {
        print_entries_with_selection(ui_state, visible, entries)?;
    }

    if ui_state.is_filtering {
        queue!(
            stdout,
            SetAttribute(Attribute::Bold),
            Print(format!("Filter: {}", ui_state.filter_text)),
            SetAttribute(Attribute::Reset)
        )?;
    }

    stdout.flush()?;
    Ok(())
}

fn print_header(title: &str, ui_state: &UiState, visible_count: usize) -> Result<()> {
    let mut stdout = stdout();
    let width = ui_state.viewport.width as usize;
    let left_padding = "  ";

    let instructions = if ui_state.is_filtering {
        format!("{title}   |   <esc>: Stop Filtering")
    } else {
        format!(
            "{title}   |   /: Filter   |   {}/{}   |   q: Quit",
            pad_to_width_of(ui_state.selected_index + 1, visible_count),
            visible_count
        )
    };

    let right_padding =
        " ".repeat(width.saturating_sub(left_padding.len() + instructions.chars().count()));

    queue!(
        stdout,
        MoveTo(0, 0),
        SetBackgroundColor(DarkGreen),
        Print(left_padding),
        Print(instructions),
        Print(right_padding),
        SetBackgroundColor(Reset),
        SetForegroundColor(Reset),
    )?;

    Ok(())
}

/// Pad a value to match the width of the largest value
fn pad_to_width_of<T: Display>(value: T, max_number: usize) -> String {
    let width = max_number.to_string().len();
    format!("{value:>width$}")
}

fn print_entries_with_selection(
    ui_state: &UiState,
    visible: &[usize],
    entries: &[PickerEntry],
) -> Result<()> {
    let mut stdout = stdout();
    let viewport = &ui_state.viewport;

    let rows = visible
        .iter()
        .enumerate()
        .skip(viewport.offset)
        .take(viewport.height as usize);

    for (row, (index, position)) in rows.enumerate() {
        let is_selected = index == ui_state.selected_index;
        let number = pad_to_width_of(position + 1, entries.len());
        let content = format!("[{number}] {}", entries[*position]);
        let padding = " ".repeat((viewport.width as usize).saturating_sub(content.chars().count()));

        queue!(
            stdout,
            MoveTo(0, u16::try_from(row + 1).unwrap_or(u16::MAX)),
            Clear(ClearType::CurrentLine)
        )?;

        if is_selected {
            queue!(
                stdout,
                SetAttribute(Attribute::Bold),
                SetBackgroundColor(DarkBlue),
                SetForegroundColor(Yellow),
            )?;
        }

        queue!(
            stdout,
            Print(content),
            Print(padding),
            SetAttribute(Attribute::Reset),
            SetBackgroundColor(Reset),
            SetForegroundColor(Reset),
            cursor::MoveToNextLine(1)
        )?;
    }

    Ok(())
}
