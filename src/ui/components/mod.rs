mod chat_panel;
mod command_palette;
mod data_list;
mod dialogs;
mod form_dialog;
mod input;
mod key_result;

pub use chat_panel::ChatPanel;
pub use command_palette::{CommandPalette, PaletteEvent};
pub use data_list::render_mapped;
pub use dialogs::{confirm_key, render_confirm, render_info, ConfirmEvent};
pub use form_dialog::{FormDialog, FormEvent};
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
