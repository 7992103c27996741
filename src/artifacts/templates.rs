//! File templates written into the new root.
//!
//! Each function renders one file from installation choices. No I/O.

use crate::types::{Compositor, Keymap};

/// Display name used in branding
pub const DISTRO_NAME: &str = "CVH Linux";

pub fn render_locale_gen(locale: &str) -> String {
    // locale.gen lines are "<locale> <charset>"
    let charset = locale.rsplit_once('.').map(|(_, c)| c).unwrap_or("UTF-8");
    format!("{} {}\n", locale, charset)
}

pub fn render_locale_conf(locale: &str) -> String {
    format!("LANG={}\n", locale)
}

pub fn render_vconsole(keymap: Keymap) -> String {
    format!("KEYMAP={}\n", keymap)
}

pub fn render_hostname(hostname: &str) -> String {
    format!("{}\n", hostname)
}

pub fn render_hosts(hostname: &str) -> String {
    format!(
        "127.0.0.1\tlocalhost\n\
         ::1\t\tlocalhost\n\
         127.0.1.1\t{0}.localdomain\t{0}\n",
        hostname
    )
}

/// SDDM drop-in: Wayland greeter, session list from wayland-sessions.
pub fn render_sddm_conf() -> String {
    "# Generated by cvh-install\n\
     [General]\n\
     DisplayServer=wayland\n\
     Numlock=on\n\
     \n\
     [Wayland]\n\
     SessionDir=/usr/share/wayland-sessions\n\
     \n\
     [Users]\n\
     RememberLastUser=true\n\
     RememberLastSession=true\n"
        .to_string()
}

pub fn render_sudoers() -> String {
    "%wheel ALL=(ALL:ALL) ALL\n".to_string()
}

pub fn render_zshrc() -> String {
    r#"# Generated by cvh-install

# History
HISTFILE=~/.zsh_history
HISTSIZE=10000
SAVEHIST=10000
setopt APPEND_HISTORY
setopt SHARE_HISTORY
setopt HIST_IGNORE_DUPS
setopt HIST_IGNORE_SPACE
setopt HIST_REDUCE_BLANKS

# Completion
autoload -Uz compinit && compinit

# Plugins
[ -f /usr/share/zsh/plugins/zsh-autosuggestions/zsh-autosuggestions.zsh ] && \
    source /usr/share/zsh/plugins/zsh-autosuggestions/zsh-autosuggestions.zsh
[ -f /usr/share/zsh/plugins/zsh-syntax-highlighting/zsh-syntax-highlighting.zsh ] && \
    source /usr/share/zsh/plugins/zsh-syntax-highlighting/zsh-syntax-highlighting.zsh

alias ls='eza --group-directories-first'
alias ll='eza -la --group-directories-first'
alias cat='bat --paging=never'

PROMPT='%F{cyan}%n@%m%f %F{blue}%~%f %# '
"#
    .to_string()
}

/// Start the compositor on VT1 when no Wayland session exists yet.
/// Only reached when SDDM is not running.
pub fn render_zprofile(compositor: Compositor) -> String {
    format!(
        "# Generated by cvh-install\n\
         if [ -z \"$WAYLAND_DISPLAY\" ] && [ \"$XDG_VTNR\" = \"1\" ]; then\n\
         \x20   exec {}\n\
         fi\n",
        compositor.session_command()
    )
}

/// File name of the session descriptor in `/usr/share/wayland-sessions`
pub fn session_file_name(compositor: Compositor) -> String {
    format!("{}.desktop", compositor)
}

pub fn render_session_descriptor(compositor: Compositor) -> String {
    format!(
        "[Desktop Entry]\n\
         Name={label}\n\
         Comment={label} on {distro}\n\
         Exec={exec}\n\
         Type=Application\n\
         DesktopNames={label}\n",
        label = compositor.label(),
        distro = DISTRO_NAME,
        exec = compositor.session_command()
    )
}

/// Path of the compositor config relative to the user's home
pub fn compositor_config_path(compositor: Compositor) -> &'static str {
    match compositor {
        Compositor::Niri => ".config/niri/config.kdl",
        Compositor::Hyprland => ".config/hypr/hyprland.conf",
    }
}

pub fn render_compositor_config(compositor: Compositor, keymap: Keymap) -> String {
    match compositor {
        Compositor::Niri => render_niri_config(keymap),
        Compositor::Hyprland => render_hyprland_config(keymap),
    }
}

fn render_hyprland_config(keymap: Keymap) -> String {
    let mut out = String::from(
        "# Generated by cvh-install\n\
         monitor = ,preferred,auto,1\n\
         \n\
         $terminal = kitty\n\
         $menu = wofi --show drun\n\
         \n\
         exec-once = waybar\n\
         exec-once = mako\n\
         exec-once = hyprpaper\n\
         exec-once = /usr/lib/polkit-kde-authentication-agent-1\n\
         \n",
    );
    out.push_str(&format!(
        "input {{\n\
         \x20   kb_layout = {}\n\
         \x20   follow_mouse = 1\n\
         \x20   touchpad {{\n\
         \x20       natural_scroll = true\n\
         \x20   }}\n\
         }}\n\n",
        keymap.xkb_layout()
    ));
    out.push_str(
        "general {\n\
         \x20   gaps_in = 5\n\
         \x20   gaps_out = 10\n\
         \x20   border_size = 2\n\
         \x20   layout = dwindle\n\
         }\n\
         \n\
         $mainMod = SUPER\n\
         bind = $mainMod, Return, exec, $terminal\n\
         bind = $mainMod, D, exec, $menu\n\
         bind = $mainMod, Q, killactive,\n\
         bind = $mainMod, F, fullscreen,\n\
         bind = $mainMod, L, exec, hyprlock\n\
         bind = $mainMod SHIFT, E, exit,\n",
    );
    for n in 1..=9 {
        out.push_str(&format!("bind = $mainMod, {0}, workspace, {0}\n", n));
        out.push_str(&format!("bind = $mainMod SHIFT, {0}, movetoworkspace, {0}\n", n));
    }
    out.push_str("bindm = $mainMod, mouse:272, movewindow\n");
    out
}

fn render_niri_config(keymap: Keymap) -> String {
    let mut out = format!(
        "// Generated by cvh-install\n\
         input {{\n\
         \x20   keyboard {{\n\
         \x20       xkb {{\n\
         \x20           layout \"{}\"\n\
         \x20       }}\n\
         \x20   }}\n\
         \x20   touchpad {{\n\
         \x20       tap\n\
         \x20       natural-scroll\n\
         \x20   }}\n\
         }}\n\n",
        keymap.xkb_layout()
    );
    out.push_str(
        "layout {\n\
         \x20   gaps 8\n\
         \x20   center-focused-column \"never\"\n\
         }\n\
         \n\
         spawn-at-startup \"waybar\"\n\
         spawn-at-startup \"mako\"\n\
         spawn-at-startup \"xwayland-satellite\"\n\
         spawn-at-startup \"/usr/lib/polkit-kde-authentication-agent-1\"\n\
         \n\
         prefer-no-csd\n\
         \n\
         binds {\n\
         \x20   Mod+Return { spawn \"alacritty\"; }\n\
         \x20   Mod+D { spawn \"fuzzel\"; }\n\
         \x20   Mod+L { spawn \"swaylock\"; }\n\
         \x20   Mod+Q { close-window; }\n\
         \x20   Mod+F { maximize-column; }\n\
         \x20   Mod+Left { focus-column-left; }\n\
         \x20   Mod+Right { focus-column-right; }\n\
         \x20   Mod+Shift+E { quit; }\n",
    );
    for n in 1..=9 {
        out.push_str(&format!("    Mod+{0} {{ focus-workspace {0}; }}\n", n));
    }
    out.push_str("}\n");
    out
}

pub fn render_os_release() -> String {
    format!(
        "NAME=\"{0}\"\n\
         PRETTY_NAME=\"{0}\"\n\
         ID=cvh\n\
         ID_LIKE=arch\n\
         BUILD_ID=rolling\n\
         ANSI_COLOR=\"38;2;0;170;170\"\n\
         LOGO=archlinux-logo\n",
        DISTRO_NAME
    )
}

pub fn render_issue() -> String {
    format!("{} \\r (\\l)\n\n", DISTRO_NAME)
}

pub fn render_multilib_section() -> String {
    "\n[multilib]\nInclude = /etc/pacman.d/mirrorlist\n".to_string()
}

pub fn render_chaotic_section() -> String {
    "\n[chaotic-aur]\nInclude = /etc/pacman.d/chaotic-mirrorlist\n".to_string()
}
