use crate::Screen;
use dioxus::prelude::*;

const ACTIVE_STYLE: &str = "flex: 1; padding: 12px; margin: 0 5px; border: none; border-radius: 8px; cursor: pointer; font-size: 14px; text-align: center; background: #0066cc; color: #ffffff;";
const INACTIVE_STYLE: &str = "flex: 1; padding: 12px; margin: 0 5px; border: none; border-radius: 8px; cursor: pointer; font-size: 14px; text-align: center; background: #ffffff; color: #333;";

#[component]
pub fn NavigationBar(
    current_screen: Screen,
    on_navigate: EventHandler<Screen>,
    on_sign_out: EventHandler<()>,
) -> Element {
    let style_for = |screen: Screen| {
        if current_screen == screen {
            ACTIVE_STYLE
        } else {
            INACTIVE_STYLE
        }
    };
    let camera_style = style_for(Screen::Capture);
    let gallery_style = style_for(Screen::Gallery);
    let nav_style = "display: flex; justify-content: space-around; padding: 10px; background: #f0f0f0; border-top: 1px solid #ddd;";

    rsx! {
        div {
            style: "{nav_style}",

            button {
                style: camera_style,
                onclick: move |_| on_navigate.call(Screen::Capture),
                "📷 Camera"
            }

            button {
                style: gallery_style,
                onclick: move |_| on_navigate.call(Screen::Gallery),
                "🖼️ Gallery"
            }

            button {
                style: INACTIVE_STYLE,
                onclick: move |_| on_sign_out.call(()),
                "🚪 Sign out"
            }
        }
    }
}
