//! Visualization utilities for tangent_bug
//!
//! Collects plot layers and renders them onto a single gnuplot axes.

use std::f64::consts::PI;

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::aerial_navigation::simulation::SimObstacle;
use crate::common::{NavigationError, NavigationResult, Pose2D, Vec2};

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00FF00";
    pub const BLUE: &str = "#0000FF";
    pub const CYAN: &str = "#00FFFF";
    pub const GRAY: &str = "#808080";

    pub const OBSTACLE: &str = BLACK;
    pub const MEMORY: &str = GRAY;
    pub const START: &str = GREEN;
    pub const GOAL: &str = BLUE;
    pub const TRAJECTORY: &str = RED;
    pub const DRONE: &str = CYAN;
}

/// Style for line rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::new(colors::TRAJECTORY, "Trajectory")
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

#[derive(Debug, Clone)]
enum Layer {
    Lines { x: Vec<f64>, y: Vec<f64>, style: PathStyle },
    Points { x: Vec<f64>, y: Vec<f64>, style: PointStyle },
}

fn split_xy(points: &[Vec2]) -> (Vec<f64>, Vec<f64>) {
    points.iter().map(|p| (p.x, p.y)).unzip()
}

/// Plot builder over a single 2D axes
pub struct Visualizer {
    layers: Vec<Layer>,
    title: String,
    x_label: String,
    y_label: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
    aspect_ratio: Option<f64>,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            title: String::new(),
            x_label: "X [m]".to_string(),
            y_label: "Y [m]".to_string(),
            x_range: None,
            y_range: None,
            aspect_ratio: Some(1.0),
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn set_x_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.x_range = Some((min, max));
        self
    }

    pub fn set_y_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some((min, max));
        self
    }

    /// Set aspect ratio (None for auto)
    pub fn set_aspect_ratio(&mut self, ratio: Option<f64>) -> &mut Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Number of layers added so far
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn plot_path(&mut self, path: &[Vec2], style: &PathStyle) -> &mut Self {
        if path.is_empty() {
            return self;
        }
        let (x, y) = split_xy(path);
        self.layers.push(Layer::Lines { x, y, style: style.clone() });
        self
    }

    pub fn plot_points(&mut self, points: &[Vec2], style: &PointStyle) -> &mut Self {
        if points.is_empty() {
            return self;
        }
        let (x, y) = split_xy(points);
        self.layers.push(Layer::Points { x, y, style: style.clone() });
        self
    }

    /// Flown trajectory
    pub fn plot_trajectory(&mut self, trajectory: &[Vec2]) -> &mut Self {
        self.plot_path(trajectory, &PathStyle::default())
    }

    /// Remembered obstacle points, world frame
    pub fn plot_memory(&mut self, points: &[Vec2]) -> &mut Self {
        let style = PointStyle::new(colors::MEMORY, "Memory")
            .with_symbol('S')
            .with_size(0.5);
        self.plot_points(points, &style)
    }

    /// Obstacle outlines of a simulated world
    pub fn plot_obstacles(&mut self, obstacles: &[SimObstacle]) -> &mut Self {
        let style = PathStyle::new(colors::OBSTACLE, "").with_line_width(1.5);
        for obstacle in obstacles {
            let outline: Vec<Vec2> = match obstacle {
                SimObstacle::Circle(c) => (0..=36)
                    .map(|i| c.center + Vec2::from_polar(c.radius, i as f64 * PI / 18.0))
                    .collect(),
                SimObstacle::Wall { start, end } => vec![*start, *end],
            };
            self.plot_path(&outline, &style);
        }
        self
    }

    /// Drone position with a heading tick
    pub fn plot_drone(&mut self, pose: &Pose2D, size: f64) -> &mut Self {
        let tip = pose.position + Vec2::from_polar(size, pose.yaw);
        self.plot_points(&[pose.position], &PointStyle::new(colors::DRONE, "Drone").with_size(size));
        self.plot_path(&[pose.position, tip], &PathStyle::new(colors::DRONE, ""))
    }

    pub fn plot_start(&mut self, point: Vec2) -> &mut Self {
        self.plot_points(&[point], &PointStyle::new(colors::START, "Start").with_size(1.5))
    }

    pub fn plot_goal(&mut self, point: Vec2) -> &mut Self {
        self.plot_points(&[point], &PointStyle::new(colors::GOAL, "Goal").with_size(1.5))
    }

    pub fn show(&mut self) -> NavigationResult<()> {
        let mut figure = self.render();
        figure
            .show()
            .map(|_| ())
            .map_err(|e| NavigationError::Visualization(e.to_string()))
    }

    pub fn save_png(&mut self, path: &str, width: u32, height: u32) -> NavigationResult<()> {
        let mut figure = self.render();
        figure
            .save_to_png(path, width, height)
            .map_err(|e| NavigationError::Visualization(e.to_string()))
    }

    pub fn save_svg(&mut self, path: &str) -> NavigationResult<()> {
        let mut figure = self.render();
        figure
            .save_to_svg(path, 800, 600)
            .map_err(|e| NavigationError::Visualization(e.to_string()))
    }

    fn render(&self) -> Figure {
        let mut figure = Figure::new();
        let axes = figure.axes2d();

        for layer in &self.layers {
            match layer {
                Layer::Lines { x, y, style } => {
                    axes.lines(
                        x,
                        y,
                        &[
                            Caption(style.caption.as_str()),
                            Color(style.color.as_str()),
                            LineWidth(style.line_width),
                        ],
                    );
                }
                Layer::Points { x, y, style } => {
                    axes.points(
                        x,
                        y,
                        &[
                            Caption(style.caption.as_str()),
                            Color(style.color.as_str()),
                            PointSymbol(style.symbol),
                            PointSize(style.size),
                        ],
                    );
                }
            }
        }

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label(&self.x_label, &[]);
        axes.set_y_label(&self.y_label, &[]);
        if let Some((min, max)) = self.x_range {
            axes.set_x_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some((min, max)) = self.y_range {
            axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some(ratio) = self.aspect_ratio {
            axes.set_aspect_ratio(AutoOption::Fix(ratio));
        }
        figure
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}
