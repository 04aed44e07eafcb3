use super::{
    ActiveTheme, AnyElement, AppView, Button, ButtonVariants, Context, FluentBuilder,
    InteractiveElement, IntoElement, ParentElement, Screen, SensorDevice, SensorState,
    SharedString, Styled, StyledExt, div, h_flex, pipeline, px, v_flex,
};

impl AppView {
    pub(super) fn initial_sensor_state() -> (Screen, Vec<SensorDevice>, Option<String>) {
        match pipeline::available_sensors() {
            Ok(sensors) => (
                Screen::Sensor(SensorState::Selection {
                    options: sensors.clone(),
                    selected: 0,
                    start_error: None,
                }),
                sensors,
                None,
            ),
            Err(err) => {
                log::error!("failed to enumerate sensors: {err}");
                (Screen::Main, Vec::new(), Some(format!("没有可用传感器: {err}")))
            }
        }
    }

    fn picker_shell(title: impl IntoElement) -> gpui::Div {
        v_flex()
            .gap_2()
            .p_4()
            .rounded_xl()
            .bg(gpui::rgba(0x0f1419f5))
            .border_1()
            .border_color(gpui::rgba(0x2d3748ff))
            .shadow_lg()
            .child(title)
    }

    fn picker_title() -> gpui::Div {
        h_flex()
            .gap_2()
            .items_center()
            .child(div().text_base().text_color(gpui::rgb(0xa5b4fc)).child("◉"))
            .child(
                div()
                    .text_sm()
                    .font_semibold()
                    .text_color(gpui::rgb(0xe2e8f0))
                    .child("选择深度传感器"),
            )
    }

    fn sensor_row(
        device: &SensorDevice,
        is_selected: bool,
        on_pick: impl Fn(&mut Self, &mut Context<'_, Self>) + 'static,
        cx: &mut Context<'_, Self>,
    ) -> gpui::Div {
        h_flex()
            .w_full()
            .gap_3()
            .items_center()
            .p_3()
            .rounded_lg()
            .cursor_pointer()
            .bg(if is_selected {
                gpui::rgba(0x2d374855)
            } else {
                gpui::rgba(0x1e293b00)
            })
            .border_1()
            .border_color(if is_selected {
                gpui::rgba(0x64748bff)
            } else {
                gpui::rgba(0x33415500)
            })
            .hover(|this| {
                this.bg(gpui::rgba(0x2d374844))
                    .border_color(gpui::rgba(0x475569ff))
            })
            .on_mouse_down(
                gpui::MouseButton::Left,
                cx.listener(move |this, _, _, cx| {
                    on_pick(this, cx);
                    cx.notify();
                }),
            )
            .child(
                div()
                    .text_lg()
                    .flex_shrink_0()
                    .text_color(if is_selected {
                        gpui::rgb(0xa5b4fc)
                    } else {
                        gpui::rgb(0x94a3b8)
                    })
                    .child("●"),
            )
            .child(
                div()
                    .flex_1()
                    .text_sm()
                    .text_color(if is_selected {
                        gpui::rgb(0xe2e8f0)
                    } else {
                        gpui::rgb(0xcbd5e1)
                    })
                    .overflow_hidden()
                    .text_ellipsis()
                    .whitespace_nowrap()
                    .child(device.label.clone()),
            )
            .when(is_selected, |this| {
                this.child(
                    div()
                        .text_sm()
                        .flex_shrink_0()
                        .text_color(gpui::rgb(0xa5b4fc))
                        .child("✓"),
                )
            })
    }

    pub(super) fn error_banner(message: String) -> gpui::Div {
        h_flex()
            .gap_2()
            .items_start()
            .mt_2()
            .p_3()
            .rounded_lg()
            .bg(gpui::rgba(0x7f1d1d33))
            .border_1()
            .border_color(gpui::rgba(0xef4444aa))
            .child(
                div()
                    .text_sm()
                    .flex_shrink_0()
                    .text_color(gpui::rgb(0xfca5a5))
                    .child("!"),
            )
            .child(
                div()
                    .flex_1()
                    .text_xs()
                    .text_color(gpui::rgb(0xfca5a5))
                    .overflow_hidden()
                    .child(message),
            )
    }

    fn render_sensor_picker_startup(
        &mut self,
        sensors: &[SensorDevice],
        selected_idx: usize,
        error_msg: Option<&str>,
        cx: &mut Context<'_, Self>,
    ) -> AnyElement {
        let mut picker = Self::picker_shell(Self::picker_title().w_full().mb_2());

        for (idx, device) in sensors.iter().enumerate() {
            picker = picker.child(Self::sensor_row(
                device,
                selected_idx == idx,
                move |this, _| this.select_sensor(idx),
                cx,
            ));
        }

        if let Some(err) = error_msg {
            picker = picker.child(Self::error_banner(err.to_string()));
        }

        picker
            .child(
                Button::new(SharedString::from("sensor-confirm"))
                    .primary()
                    .label("✓ 使用所选传感器")
                    .w_full()
                    .mt_2()
                    .on_click(cx.listener(|this, _, _, cx| {
                        this.start_selected_sensor();
                        cx.notify();
                    })),
            )
            .into_any_element()
    }

    pub(super) fn render_sensor_picker_main(&mut self, cx: &mut Context<'_, Self>) -> AnyElement {
        let title_row = h_flex()
            .justify_between()
            .items_center()
            .w_full()
            .mb_2()
            .child(Self::picker_title())
            .child(
                Button::new(SharedString::from("sensor-picker-close"))
                    .label("×")
                    .ghost()
                    .on_click(cx.listener(|this, _, _, cx| {
                        this.sensor_picker_open = false;
                        cx.notify();
                    })),
            );
        let mut picker = Self::picker_shell(title_row);

        let sensors = self.available_sensors.clone();
        for (idx, device) in sensors.iter().enumerate() {
            picker = picker.child(Self::sensor_row(
                device,
                self.selected_sensor_idx == Some(idx),
                move |this, _| this.switch_sensor(idx),
                cx,
            ));
        }

        if let Some(err) = &self.sensor_error {
            picker = picker.child(Self::error_banner(err.clone()));
        }

        picker.into_any_element()
    }

    pub(super) fn render_sensor_view(
        &mut self,
        state: &mut SensorState,
        cx: &mut Context<'_, Self>,
    ) -> AnyElement {
        match state {
            SensorState::Selection {
                options,
                selected,
                start_error,
            } => {
                if options.len() == 1 && self.sensor_stream.is_none() && start_error.is_none() {
                    let device = options[0].clone();
                    match self.start_sensor_for_device(&device) {
                        Ok(()) => {
                            self.selected_sensor_idx = Some(0);
                            *state = SensorState::Ready;
                            return div()
                                .child(div().child("正在启动传感器..."))
                                .into_any_element();
                        }
                        Err(err) => {
                            *start_error = Some(format!("无法启动传感器: {err}"));
                        }
                    }
                }

                let options = options.clone();
                let selected = *selected;
                let error_msg = start_error.clone();
                let picker = self.render_sensor_picker_startup(
                    &options,
                    selected,
                    error_msg.as_deref(),
                    cx,
                );

                div()
                    .size_full()
                    .flex()
                    .items_center()
                    .justify_center()
                    .bg(gpui::rgba(0x1a233288))
                    .child(div().w(px(450.0)).child(picker))
                    .into_any_element()
            }
            SensorState::Ready => {
                let theme = cx.theme();
                v_flex()
                    .gap_2()
                    .p_4()
                    .rounded_lg()
                    .border_1()
                    .border_color(theme.border)
                    .bg(theme.group_box)
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.foreground)
                            .child("⟳ 正在启动传感器..."),
                    )
                    .into_any_element()
            }
        }
    }

    pub(super) fn switch_sensor(&mut self, idx: usize) {
        let Some(device) = self.available_sensors.get(idx).cloned() else {
            self.sensor_error = Some("无法找到所选传感器".to_string());
            return;
        };

        match self.start_sensor_for_device(&device) {
            Ok(()) => {
                self.selected_sensor_idx = Some(idx);
                self.sensor_error = None;
            }
            Err(err) => {
                self.sensor_error = Some(format!("无法启动传感器: {err}"));
            }
        }
    }

    fn select_sensor(&mut self, selected: usize) {
        if let Screen::Sensor(SensorState::Selection {
            options,
            selected: current,
            start_error,
        }) = &mut self.screen
        {
            if selected < options.len() {
                *current = selected;
                *start_error = None;
                self.selected_sensor_idx = Some(selected);
            }
        }
    }

    pub(super) fn stop_sensor_stream(&mut self) {
        if let Some(stream) = self.sensor_stream.take() {
            stream.stop();
        }
        // Drop snapshots the old stream left behind.
        while self.frame_rx.try_recv().is_ok() {}
    }

    fn start_sensor_for_device(&mut self, device: &SensorDevice) -> Result<(), String> {
        self.stop_sensor_stream();

        pipeline::start_sensor_stream(
            device.clone(),
            self.background.clone(),
            self.frame_tx.clone(),
        )
        .map(|stream| {
            self.sensor_stream = Some(stream);
            self.latest_frame = None;
            self.scene_dirty = true;
            self.sensor_error = None;
        })
        .map_err(|err| {
            log::error!("failed to start sensor {}: {err}", device.label);
            err.to_string()
        })
    }

    fn start_selected_sensor(&mut self) {
        let selected_device = match &self.screen {
            Screen::Sensor(SensorState::Selection {
                options, selected, ..
            }) => options
                .get(*selected)
                .cloned()
                .map(|device| (*selected, device)),
            _ => None,
        };

        let Some((selected_idx, device)) = selected_device else {
            if let Screen::Sensor(SensorState::Selection { start_error, .. }) = &mut self.screen {
                *start_error = Some("无法找到所选传感器".to_string());
            }
            return;
        };

        match self.start_sensor_for_device(&device) {
            Ok(()) => {
                self.selected_sensor_idx = Some(selected_idx);
                self.sensor_picker_open = false;
                self.screen = Screen::Main;
            }
            Err(err) => {
                if let Screen::Sensor(SensorState::Selection { start_error, .. }) = &mut self.screen
                {
                    *start_error = Some(format!("无法启动传感器: {err}"));
                }
            }
        }
    }
}
