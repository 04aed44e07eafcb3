use super::render_util::scene_to_image;
use super::titlebar::StatusPill;
use super::{
    ActiveTheme, AnyElement, AppView, Arc, Button, ButtonVariants, Context, IntoElement,
    ObjectFit, ParentElement, RenderImage, SCENE_DISPLAY_SIZE, SharedString, Styled, StyledImage,
    Window, div, h_flex, img, pipeline, px, v_flex,
};

impl AppView {
    pub(super) fn render_main(
        &mut self,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) -> AnyElement {
        self.update_scene(window, cx);

        let (scene_width, scene_height) = SCENE_DISPLAY_SIZE;

        let sensor_label = self
            .selected_sensor_idx
            .and_then(|idx| self.available_sensors.get(idx))
            .map(|s| s.label.clone())
            .unwrap_or_else(|| {
                if self.available_sensors.is_empty() {
                    "未检测到传感器".to_string()
                } else {
                    "未选择传感器".to_string()
                }
            });

        let frame_status = self
            .latest_frame
            .as_ref()
            .map(|f| format!("传感器: {sensor_label} 第 {} 帧", f.sequence))
            .unwrap_or_else(|| format!("传感器: {sensor_label}，等待画面..."));

        let active_player = self
            .latest_frame
            .as_ref()
            .map(|f| f.active_player)
            .unwrap_or(0);
        let player_text = if active_player > 0 {
            format!("{active_player}")
        } else {
            "--".to_string()
        };

        let scene_view: AnyElement = if let Some(image) = &self.latest_image {
            img(image.clone())
                .size_full()
                .object_fit(ObjectFit::Contain)
                .rounded_t_lg()
                .into_any_element()
        } else {
            div()
                .size_full()
                .flex()
                .items_center()
                .justify_center()
                .text_sm()
                .text_color(gpui::rgb(0x8b95a5))
                .rounded_t_lg()
                .child("等待传感器...")
                .into_any_element()
        };

        let scene_shell = div()
            .relative()
            .w(px(scene_width))
            .h(px(scene_height))
            .overflow_hidden()
            .rounded_t_lg()
            .bg(gpui::rgb(0x000000))
            .child(scene_view);

        let mut info_row = h_flex()
            .justify_between()
            .items_center()
            .gap_2()
            .child(
                div()
                    .text_xs()
                    .text_color(gpui::rgb(0xa0aab8))
                    .child(format!("当前玩家: {player_text}")),
            )
            .child(
                Button::new(SharedString::from("composite-mode-toggle"))
                    .outline()
                    .label(format!("◐ {}", self.scene_config.mode.label()))
                    .on_click(cx.listener(|this, _, _, cx| {
                        this.scene_config.mode = this.scene_config.mode.toggled();
                        this.scene_dirty = true;
                        log::info!("composite mode: {:?}", this.scene_config.mode);
                        cx.notify();
                    })),
            );

        if self.available_sensors.len() > 1 {
            let picker_label = if self.sensor_picker_open {
                "◉ 关闭"
            } else {
                "◉ 切换"
            };
            info_row = info_row.child(
                Button::new(SharedString::from("sensor-picker-toggle"))
                    .outline()
                    .label(picker_label)
                    .on_click(cx.listener(|this, _, _, cx| {
                        this.sensor_picker_open = !this.sensor_picker_open;
                        cx.notify();
                    })),
            );
        }

        let mut overlay_panel: Option<AnyElement> = None;
        if self.sensor_picker_open && !self.available_sensors.is_empty() {
            overlay_panel = Some(self.render_sensor_picker_main(cx));
        } else if let Some(err) = &self.sensor_error {
            overlay_panel = Some(Self::error_banner(err.clone()).into_any_element());
        }

        let mut scene_card = div().relative().w(px(scene_width)).child(
            v_flex()
                .w_full()
                .rounded_lg()
                .overflow_hidden()
                .bg(gpui::rgb(0x0f1419))
                .child(scene_shell)
                .child(
                    v_flex().gap_2().p_3().child(info_row).child(
                        div()
                            .text_xs()
                            .text_color(gpui::rgb(0x8b95a5))
                            .overflow_hidden()
                            .text_ellipsis()
                            .whitespace_nowrap()
                            .child(frame_status),
                    ),
                ),
        );

        if let Some(panel) = overlay_panel {
            let panel_width = (scene_width * 0.85).min(400.0);
            scene_card = scene_card.child(
                div()
                    .absolute()
                    .top(px(16.0))
                    .left(px((scene_width - panel_width) / 2.0))
                    .w(px(panel_width))
                    .child(panel),
            );
        }

        let theme = cx.theme();
        let sensor_pill = if self.sensor_stream.is_some() && self.latest_frame.is_some() {
            StatusPill {
                color: theme.success,
                icon: "●",
                text: "传感器就绪".to_string(),
            }
        } else if self.sensor_stream.is_some() {
            StatusPill {
                color: theme.muted_foreground,
                icon: "○",
                text: "等待传感器".to_string(),
            }
        } else {
            StatusPill {
                color: theme.danger,
                icon: "○",
                text: "传感器未启动".to_string(),
            }
        };
        let player_pill = if active_player > 0 {
            StatusPill {
                color: theme.success,
                icon: "●",
                text: format!("正在跟踪玩家 {active_player}"),
            }
        } else {
            StatusPill {
                color: theme.muted_foreground,
                icon: "○",
                text: "未跟踪到玩家".to_string(),
            }
        };

        let titlebar = self.render_titlebar(sensor_pill, player_pill, window, cx);

        v_flex()
            .size_full()
            .bg(gpui::rgb(0x1a2332))
            .child(titlebar)
            .child(
                h_flex()
                    .flex_1()
                    .p_4()
                    .items_start()
                    .justify_center()
                    .child(scene_card),
            )
            .into_any_element()
    }

    /// Pulls the newest snapshot and repaints the scene when anything changed.
    fn update_scene(&mut self, window: &mut Window, cx: &mut Context<'_, Self>) {
        let mut newest = None;
        while let Ok(frame) = self.frame_rx.try_recv() {
            newest = Some(frame);
        }
        if let Some(frame) = newest {
            if self.latest_frame.as_ref().map(|f| f.active_player) != Some(frame.active_player) {
                log::debug!("ui now shows player {}", frame.active_player);
            }
            self.latest_frame = Some(frame);
            self.scene_dirty = true;
        }

        if !self.scene_dirty && self.latest_image.is_some() {
            return;
        }

        let scene = pipeline::render_scene(
            self.latest_frame.as_ref(),
            &self.scene_config,
            &self.line_sprite,
        );
        match scene_to_image(scene) {
            Some(image) => self.replace_latest_image(image, window, cx),
            None => log::warn!("rendered scene does not fit its pixel buffer"),
        }
        self.scene_dirty = false;
    }

    fn replace_latest_image(
        &mut self,
        new_image: Arc<RenderImage>,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) {
        if let Some(old_image) = self.latest_image.replace(new_image) {
            // Explicitly drop the previous GPU texture; otherwise the sprite atlas keeps
            // every frame and memory will climb rapidly while the sensor is running.
            cx.drop_image(old_image, Some(window));
        }
    }
}
