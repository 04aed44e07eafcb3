use std::{mem, sync::Arc};

use crossbeam_channel::{Receiver, Sender};
use gpui::prelude::FluentBuilder;
use gpui::{
    AnyElement, App, AppContext, Context, Hsla, InteractiveElement, IntoElement, ObjectFit,
    ParentElement, Render, RenderImage, SharedString, Styled, StyledImage, TitlebarOptions, Window,
    WindowControlArea, WindowDecorations, WindowOptions, div, img, px,
};
use gpui_component::{
    ActiveTheme, Root, StyledExt,
    button::{Button, ButtonVariants},
    h_flex, v_flex,
};
use image::{Frame as ImageFrame, ImageBuffer, Rgba};

use crate::{
    pipeline::{
        self, CompositedFrame, SceneConfig, SensorDevice, SensorStream, line_sprite,
    },
    types::ColorImage,
};

mod main_view;
mod render_util;
mod sensor_view;
mod titlebar;

const SCENE_DISPLAY_SIZE: (f32, f32) = (640.0, 480.0);

pub fn launch_ui(
    app: &mut App,
    frame_rx: Receiver<CompositedFrame>,
    frame_tx: Sender<CompositedFrame>,
    background: Arc<ColorImage>,
) -> gpui::Result<()> {
    let window_options = WindowOptions {
        titlebar: Some(TitlebarOptions {
            title: Some("Kinect Player".into()),
            appears_transparent: true,
            traffic_light_position: None,
        }),
        window_decorations: Some(WindowDecorations::Client),
        ..Default::default()
    };

    app.open_window(window_options, move |window, app| {
        let view = app.new(|_| AppView::new(frame_rx, frame_tx, background));
        app.new(|cx| Root::new(view, window, cx))
    })?;

    Ok(())
}

struct AppView {
    screen: Screen,
    frame_rx: Receiver<CompositedFrame>,
    frame_tx: Sender<CompositedFrame>,
    background: Arc<ColorImage>,
    sensor_stream: Option<SensorStream>,
    available_sensors: Vec<SensorDevice>,
    selected_sensor_idx: Option<usize>,
    sensor_error: Option<String>,
    sensor_picker_open: bool,
    latest_frame: Option<CompositedFrame>,
    latest_image: Option<Arc<RenderImage>>,
    scene_config: SceneConfig,
    scene_dirty: bool,
    line_sprite: ColorImage,
}

enum Screen {
    Sensor(SensorState),
    Main,
}

enum SensorState {
    Selection {
        options: Vec<SensorDevice>,
        selected: usize,
        start_error: Option<String>,
    },
    Ready,
}

impl AppView {
    fn new(
        frame_rx: Receiver<CompositedFrame>,
        frame_tx: Sender<CompositedFrame>,
        background: Arc<ColorImage>,
    ) -> Self {
        let (screen, available_sensors, sensor_error) = Self::initial_sensor_state();
        let selected_sensor_idx = if available_sensors.is_empty() {
            None
        } else {
            Some(0)
        };

        Self {
            screen,
            frame_rx,
            frame_tx,
            background,
            sensor_stream: None,
            available_sensors,
            selected_sensor_idx,
            sensor_error,
            sensor_picker_open: false,
            latest_frame: None,
            latest_image: None,
            scene_config: SceneConfig::default(),
            scene_dirty: true,
            line_sprite: line_sprite(),
        }
    }
}

impl Render for AppView {
    fn render(
        &mut self,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) -> impl gpui::IntoElement {
        cx.defer_in(window, |_, _, cx| {
            cx.notify();
        });

        let mut screen = mem::replace(&mut self.screen, Screen::Main);
        let view = match screen {
            Screen::Sensor(mut state) => {
                let view = self.render_sensor_view(&mut state, cx);
                screen = match state {
                    SensorState::Ready => Screen::Main,
                    state => Screen::Sensor(state),
                };
                view
            }
            Screen::Main => {
                screen = Screen::Main;
                self.render_main(window, cx)
            }
        };
        self.screen = screen;
        view
    }
}
