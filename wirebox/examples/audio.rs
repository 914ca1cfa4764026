//! Audio demo: named backends, overrides and the three lifetimes.
//!
//! Run with `RUST_LOG=wirebox_container=debug` to watch constructions.

use std::rc::Rc;

use tracing_subscriber::EnvFilter;
use wirebox::prelude::*;

// === Interfaces and implementations ===

trait Audio {
    fn play(&self, sound: &str) -> String;
}

struct DirectX;
struct Alsa;

impl Audio for DirectX {
    fn play(&self, sound: &str) -> String {
        format!("[directx] {sound}")
    }
}

impl Audio for Alsa {
    fn play(&self, sound: &str) -> String {
        format!("[alsa] {sound}")
    }
}

impl Injectable for DirectX {
    const LIFETIME: Lifetime = Lifetime::Singleton;
    type Deps = ();

    fn construct(_: Resolved<'_, Self::Deps>) -> Self {
        DirectX
    }
}

impl Injectable for Alsa {
    const LIFETIME: Lifetime = Lifetime::Singleton;
    type Deps = ();

    fn construct(_: Resolved<'_, Self::Deps>) -> Self {
        Alsa
    }
}

implements!(DirectX => dyn Audio);
implements!(Alsa => dyn Audio);

/// Shared by everyone who holds it; rebuilt once everyone lets go.
struct Mixer {
    audio: Rc<dyn Audio>,
}

impl Injectable for Mixer {
    const LIFETIME: Lifetime = Lifetime::ReferenceCounting;
    type Deps = (Dep<dyn Audio>,);

    fn construct(deps: Resolved<'_, Self::Deps>) -> Self {
        let (audio,) = deps;
        Mixer { audio }
    }
}

/// A new one for every caller.
struct Button {
    mixer: Rc<Mixer>,
    label: String,
}

impl Injectable for Button {
    const LIFETIME: Lifetime = Lifetime::NotControlled;
    type Deps = (Dep<Mixer>, Dep<dyn Audio, Ref>);

    fn construct(deps: Resolved<'_, Self::Deps>) -> Self {
        let (mixer, audio) = deps;
        Button {
            mixer,
            label: audio.play("button ready"),
        }
    }
}

impl Button {
    fn click(&self) -> String {
        self.mixer.audio.play("click")
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wirebox_container=info")),
        )
        .init();

    let mut container = Container::builder().with_capacity(8).build();
    container.register::<DirectX, dyn Audio>("", Overrides::new());
    container.register::<Alsa, dyn Audio>("Linux", Overrides::new());
    container.register_type::<Mixer>();
    container.register::<Mixer, Mixer>("Linux", Overrides::new().with::<dyn Audio>("Linux"));
    container.register_type::<Button>();
    container.register::<Button, Button>(
        "Linux",
        Overrides::new()
            .with::<Mixer>("Linux")
            .with::<dyn Audio>("Linux"),
    );

    println!("{container:?}");

    // === NotControlled: every resolve builds a fresh button ===
    let button: Box<Button> = container.resolve_as::<Button, Unique>("")?;
    println!("{} / {}", button.label, button.click());

    let linux = container.resolve_named::<Button>("Linux")?;
    println!("{} / {}", linux.label, linux.click());

    // === ReferenceCounting: buttons share a mixer while one is alive ===
    let second = container.resolve_as::<Button, Unique>("")?;
    println!(
        "buttons share a mixer: {}",
        Rc::ptr_eq(&button.mixer, &second.mixer)
    );

    let mixer_key = TypeKey::of::<Mixer>();
    drop(button);
    drop(second);
    println!(
        "mixer after releasing every button: {:?}",
        container.instance_state(&mixer_key)
    );

    // === Wrong handles and missing bindings are reported, not panicked ===
    if let Err(err) = container.resolve_as::<Mixer, Raw>("") {
        println!("\n{err}");
    }
    if let Err(err) = container.resolve_named::<dyn Audio>("Windows") {
        println!("\n{err}");
    }

    println!("\nBindings:");
    for binding in container.bindings() {
        println!(
            "  {}[{:?}] -> {} ({}, {:?})",
            binding.interface, binding.name, binding.concrete, binding.lifetime, binding.state
        );
    }

    Ok(())
}
