//! Chat panel: message protocol, controller and page

mod controller;
mod html;
mod protocol;

pub use controller::PanelController;
pub use html::render_panel_html;
pub use protocol::PanelMessage;
