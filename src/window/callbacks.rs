//! One optional subscriber per kind of window event.

use crate::input::keyboard::KeyCode;

use ::paste::paste;
use ::std::fmt;

/// Declares the callback table: a boxed closure slot per event kind, with a
/// `set_` method which replaces the subscriber and an `emit_` method which
/// invokes it if present.
macro_rules! callback_table {
    ($($name:ident($($arg:ident: $ty:ty),*);)*) => {
        paste! {
            #[derive(Default)]
            pub(crate) struct Callbacks {
                $($name: Option<Box<dyn FnMut($($ty),*)>>,)*
            }

            impl Callbacks {
                $(
                    pub(crate) fn [<set_ $name>](
                        &mut self,
                        callback: impl FnMut($($ty),*) + 'static,
                    ) {
                        self.$name = Some(Box::new(callback));
                    }

                    pub(crate) fn [<emit_ $name>](&mut self, $($arg: $ty),*) {
                        if let Some(callback) = self.$name.as_mut() {
                            callback($($arg),*);
                        }
                    }
                )*

                /// Drops every registered subscriber.
                pub(crate) fn clear(&mut self) {
                    $(self.$name = None;)*
                }

                /// Names of the event kinds which have a subscriber.
                pub(crate) fn registered(&self) -> Vec<&'static str> {
                    let mut names = Vec::new();
                    $(
                        if self.$name.is_some() {
                            names.push(stringify!($name));
                        }
                    )*
                    names
                }
            }
        }
    };
}

callback_table! {
    key_press(code: KeyCode);
    key_release(code: KeyCode);
    mouse_motion(x: u32, y: u32);
    resize(width: u32, height: u32);
    moved(x: i32, y: i32);
    close();
    mouse_enter_exit(entered: bool);
    focus(focused: bool);
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.registered()).finish()
    }
}
