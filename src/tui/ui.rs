use crate::core::state::{App, View};
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{AuthNavigator, HomeNavigator, HomeProps, LoadingView, TitleBar};

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    let view = app.view();
    if view == View::Loading {
        // Nothing but the indicator until the session is known.
        LoadingView::new(spinner_frame, app.t("loading").to_string()).render(frame, frame.area());
        return;
    }

    use Constraint::{Length, Min};
    let layout = Layout::vertical([Length(1), Min(0)]);
    let [title_area, main_area] = layout.areas(frame.area());

    let mut title_bar = TitleBar::new(
        app.t("app.title").to_string(),
        app.profile_name.clone(),
        app.localizer.active().name.clone(),
    );
    title_bar.status_message = app.status_message.clone();
    title_bar.error = app.error.clone();
    title_bar.render(frame, title_area);

    match view {
        View::Loading => {}
        View::Unauthenticated => {
            AuthNavigator::new(&tui.auth, &app.localizer).render(frame, main_area);
        }
        View::Authenticated => {
            let props = HomeProps {
                user: app.user.as_ref(),
                profile: &app.profile_name,
                localizer: &app.localizer,
            };
            HomeNavigator::new(&tui.home, props).render(frame, main_area);
        }
    }
}
