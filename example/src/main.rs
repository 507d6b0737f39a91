use ::ash::{vk, Entry};
use ::geoms::d2::{Point2D, Size2D};
use ::std::ffi::CStr;
use ::surfer::{graphics, graphics::VulkanInstance, window::Builder, KeyCode};
use ::tracing::info;
use ::tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn main() {
    ::tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    // SAFETY: The loaded library stays alive for as long as `entry`.
    let entry = unsafe { Entry::load() }.expect("Failed to load the Vulkan library");

    let app_name = CStr::from_bytes_with_nul(b"surfer example\0").expect("Valid C string");
    let app_info = vk::ApplicationInfo::default()
        .application_name(app_name)
        .api_version(vk::API_VERSION_1_0);
    let extensions = graphics::required_extensions().expect("Unsupported platform");
    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_extension_names(extensions);
    let instance = unsafe { entry.create_instance(&create_info, None) }
        .expect("Failed to create Vulkan instance");

    {
        let graphics = VulkanInstance::new(&entry, &instance);
        let mut window = Builder::new()
            .with_title("Hello, Vulkan!")
            .with_size(Size2D {
                width: 800,
                height: 600,
            })
            .with_position(Point2D { x: 100, y: 100 })
            .build(&graphics)
            .expect("Failed to create main window");

        window.on_key_press(|key| {
            info!(%key, "Key pressed");
            if key == KeyCode::Escape {
                info!("Escape pressed, close the window to exit");
            }
        });
        window.on_key_release(|key| info!(%key, "Key released"));
        window.on_mouse_motion(|x, y| info!(x, y, "Mouse moved"));
        window.on_resize(|width, height| info!(width, height, "Resized"));
        window.on_move(|x, y| info!(x, y, "Moved"));
        window.on_focus(|focused| info!(focused, "Focus changed"));
        window.on_mouse_enter_exit(|entered| info!(entered, "Cursor crossed window edge"));
        window.on_close(|| info!("Close requested"));

        while !window.should_close() {
            window.pump_events();
            ::std::thread::sleep(::std::time::Duration::from_millis(16));
        }

        // The surface must go before the instance it was created from.
        window.destroy();
    }

    unsafe { instance.destroy_instance(None) };
}
