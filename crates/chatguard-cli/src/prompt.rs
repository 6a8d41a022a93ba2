use anyhow::Result;
use chatguard::models::message::Message;

pub mod cliclack;

pub trait Prompt {
    /// Show a message from the conversation
    fn render(&mut self, message: &Message);
    /// Show a markdown block that is not part of the conversation
    fn render_markdown(&mut self, text: &str);
    fn render_notice(&mut self, text: &str);
    fn render_warning(&mut self, text: &str);
    fn render_error(&mut self, text: &str);
    fn get_input(&mut self) -> Result<String>;
    fn show_busy(&mut self);
    fn hide_busy(&mut self);
    fn close(&self);
}

pub enum Theme {
    Light,
    Dark,
}
