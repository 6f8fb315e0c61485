use crate::model::{ResourceCategory, Tab};
use crate::pane::Navigation;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    Confirm,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextCategory,
    PrevCategory,
    JumpCategory(ResourceCategory),
    SelectTab(Tab),
    Navigate(Navigation),
    ScrollContentUp,
    ScrollContentDown,
    ContentHalfPageUp,
    ContentHalfPageDown,
    ToggleFollow,
    Select,
    Delete,
    ScaleUp,
    ScaleDown,
    StartPortForward,
    StopPortForwards,
    Refresh,
    ToggleHelp,
    CloseHelp,
    ConfirmYes,
    ConfirmNo,
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    match mode {
        InputMode::Normal => map_normal_mode_key(key),
        InputMode::Confirm => map_confirm_key(key),
        InputMode::Help => map_help_key(key),
    }
}

fn map_normal_mode_key(key: KeyEvent) -> Option<Action> {
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if control => Some(Action::Quit),
        KeyCode::Char('d') if control => Some(Action::ContentHalfPageDown),
        KeyCode::Char('u') if control => Some(Action::ContentHalfPageUp),
        _ if control || key.modifiers.contains(KeyModifiers::ALT) => None,
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Tab => Some(Action::NextCategory),
        KeyCode::BackTab => Some(Action::PrevCategory),
        KeyCode::Char(c @ '1'..='4') => ResourceCategory::from_hotkey(c).map(Action::JumpCategory),
        KeyCode::Char(c @ ('l' | 's' | 'e' | 'c' | 't' | 'x')) => {
            Tab::from_hotkey(c).map(Action::SelectTab)
        }
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Navigate(Navigation::Down)),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Navigate(Navigation::Up)),
        KeyCode::PageDown => Some(Action::Navigate(Navigation::PageDown)),
        KeyCode::PageUp => Some(Action::Navigate(Navigation::PageUp)),
        KeyCode::Char('g') | KeyCode::Home => Some(Action::Navigate(Navigation::Top)),
        KeyCode::Char('G') | KeyCode::End => Some(Action::Navigate(Navigation::Bottom)),
        KeyCode::Char('J') => Some(Action::ScrollContentDown),
        KeyCode::Char('K') => Some(Action::ScrollContentUp),
        KeyCode::Char('a') => Some(Action::ToggleFollow),
        KeyCode::Enter => Some(Action::Select),
        KeyCode::Char('d') => Some(Action::Delete),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::ScaleUp),
        KeyCode::Char('-') | KeyCode::Char('_') => Some(Action::ScaleDown),
        KeyCode::Char('p') => Some(Action::StartPortForward),
        KeyCode::Char('P') => Some(Action::StopPortForwards),
        KeyCode::Char('r') | KeyCode::F(5) => Some(Action::Refresh),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        _ => None,
    }
}

fn map_confirm_key(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::ConfirmYes),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Char('q') | KeyCode::Esc => {
            Some(Action::ConfirmNo)
        }
        _ => None,
    }
}

fn map_help_key(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    match key.code {
        KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc => Some(Action::CloseHelp),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, InputMode, map_key};
    use crate::model::{ResourceCategory, Tab};
    use crate::pane::Navigation;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn plain(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn normal_mode_maps_quit_keys() {
        assert_eq!(
            map_key(InputMode::Normal, plain(KeyCode::Char('q'))),
            Some(Action::Quit)
        );
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Normal, ctrl_c), Some(Action::Quit));
    }

    #[test]
    fn plain_c_selects_config_tab() {
        assert_eq!(
            map_key(InputMode::Normal, plain(KeyCode::Char('c'))),
            Some(Action::SelectTab(Tab::Config))
        );
        assert_eq!(
            map_key(InputMode::Normal, plain(KeyCode::Char('x'))),
            Some(Action::SelectTab(Tab::Exec))
        );
    }

    #[test]
    fn digits_jump_to_categories() {
        assert_eq!(
            map_key(InputMode::Normal, plain(KeyCode::Char('3'))),
            Some(Action::JumpCategory(ResourceCategory::Pods))
        );
        assert_eq!(map_key(InputMode::Normal, plain(KeyCode::Char('5'))), None);
    }

    #[test]
    fn shifted_keys_keep_their_meaning() {
        let back_tab = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(
            map_key(InputMode::Normal, back_tab),
            Some(Action::PrevCategory)
        );
        let stop_all = KeyEvent::new(KeyCode::Char('P'), KeyModifiers::SHIFT);
        assert_eq!(
            map_key(InputMode::Normal, stop_all),
            Some(Action::StopPortForwards)
        );
        assert_eq!(
            map_key(InputMode::Normal, plain(KeyCode::PageDown)),
            Some(Action::Navigate(Navigation::PageDown))
        );
    }

    #[test]
    fn confirm_mode_only_accepts_answers() {
        for code in [KeyCode::Char('y'), KeyCode::Char('Y')] {
            assert_eq!(
                map_key(InputMode::Confirm, plain(code)),
                Some(Action::ConfirmYes)
            );
        }
        for code in [
            KeyCode::Char('n'),
            KeyCode::Char('N'),
            KeyCode::Char('q'),
            KeyCode::Esc,
        ] {
            assert_eq!(
                map_key(InputMode::Confirm, plain(code)),
                Some(Action::ConfirmNo)
            );
        }
        for code in [KeyCode::Char('j'), KeyCode::Enter, KeyCode::Char('1')] {
            assert_eq!(map_key(InputMode::Confirm, plain(code)), None);
        }
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Confirm, ctrl_c), None);
    }

    #[test]
    fn help_mode_only_closes() {
        assert_eq!(
            map_key(InputMode::Help, plain(KeyCode::Esc)),
            Some(Action::CloseHelp)
        );
        assert_eq!(
            map_key(InputMode::Help, plain(KeyCode::Char('?'))),
            Some(Action::CloseHelp)
        );
        assert_eq!(map_key(InputMode::Help, plain(KeyCode::Char('d'))), None);
    }
}
