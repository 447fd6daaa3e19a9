use bevy_egui::egui;

/// What a key press in the text box should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRoute {
    Submit,
    /// Left for the text box, which inserts a newline at the cursor.
    InsertNewline,
    PassThrough,
}

pub fn route_key(key: egui::Key, modifiers: egui::Modifiers) -> KeyRoute {
    match key {
        egui::Key::Enter if modifiers.shift => KeyRoute::InsertNewline,
        egui::Key::Enter => KeyRoute::Submit,
        _ => KeyRoute::PassThrough,
    }
}

/// Call before adding the text box with id `input_id`.
///
/// Removes plain Enter presses from this frame's input so the text box never
/// sees them, and reports whether one happened. Only active while the text
/// box has focus.
pub fn capture_enter(ui: &mut egui::Ui, input_id: egui::Id) -> bool {
    if !ui.memory(|mem| mem.has_focus(input_id)) {
        return false;
    }

    ui.input_mut(|input| take_submit_events(&mut input.events))
}

fn take_submit_events(events: &mut Vec<egui::Event>) -> bool {
    let mut submit = false;
    events.retain(|event| match event {
        egui::Event::Key {
            key,
            pressed,
            modifiers,
            ..
        } if route_key(*key, *modifiers) == KeyRoute::Submit => {
            submit |= *pressed;
            false
        }
        _ => true,
    });
    submit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_event(key: egui::Key, pressed: bool, modifiers: egui::Modifiers) -> egui::Event {
        egui::Event::Key {
            key,
            physical_key: None,
            pressed,
            repeat: false,
            modifiers,
        }
    }

    #[test]
    fn enter_submits_and_shift_enter_inserts_newline() {
        assert_eq!(route_key(egui::Key::Enter, egui::Modifiers::NONE), KeyRoute::Submit);
        assert_eq!(
            route_key(egui::Key::Enter, egui::Modifiers::SHIFT),
            KeyRoute::InsertNewline
        );
        assert_eq!(route_key(egui::Key::A, egui::Modifiers::NONE), KeyRoute::PassThrough);
        assert_eq!(
            route_key(egui::Key::Backspace, egui::Modifiers::SHIFT),
            KeyRoute::PassThrough
        );
    }

    #[test]
    fn plain_enter_is_consumed() {
        let mut events = vec![
            egui::Event::Text("Hallo".into()),
            key_event(egui::Key::Enter, true, egui::Modifiers::NONE),
            key_event(egui::Key::Enter, false, egui::Modifiers::NONE),
        ];

        assert!(take_submit_events(&mut events));
        assert_eq!(events, vec![egui::Event::Text("Hallo".into())]);
    }

    #[test]
    fn shift_enter_reaches_the_text_box() {
        let shift_enter = key_event(egui::Key::Enter, true, egui::Modifiers::SHIFT);
        let mut events = vec![shift_enter.clone()];

        assert!(!take_submit_events(&mut events));
        assert_eq!(events, vec![shift_enter]);
    }

    #[test]
    fn release_alone_does_not_submit() {
        let mut events = vec![key_event(egui::Key::Enter, false, egui::Modifiers::NONE)];
        assert!(!take_submit_events(&mut events));
        assert!(events.is_empty());
    }
}
