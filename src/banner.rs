//! Startup banner and session summary display.

use crate::consts::{AUTHOR, HOMEPAGE, REPO};

/// Session configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub store: &'a str,
    pub coach: &'a str,
    pub settings_db: &'a str,
}

/// Print the startup banner with session info.
pub fn print_banner(info: &BannerInfo) {
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║   P R O   P E R F O R M A N C E       ║
   ║   mide tu potencial, registra tu      ║
   ║   progreso                            ║
   ╚═══════════════════════════════════════╝

   version   {}
   by        {}
   home      {}
   repo      {}
   store     {}
   coach     {}
   settings  {}

   type `NAME SCORE` to submit, /help for commands
"#,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        REPO,
        info.store,
        info.coach,
        info.settings_db,
    );
}

/// Print the session summary (submission counts + farewell).
pub fn print_session_summary(stored: usize, failed: usize) {
    if stored + failed > 0 {
        println!("session: {stored} stored, {failed} failed");
    }
    println!("¡hasta la próxima!");
}
