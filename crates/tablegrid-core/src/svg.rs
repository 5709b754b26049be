//! SVG rendering of a table grid for visual debugging.
//!
//! Enabled edges are drawn solid, disabled (merged) edges dashed, and nodes
//! as circles of their hit radius. The view box is the table's padded bbox.

use crate::geometry::BBox;
use crate::graph::Table;

/// Options for SVG generation.
#[derive(Debug, Clone)]
pub struct SvgOptions {
    /// Optional fixed width for the SVG output. If `None`, uses the bbox width.
    pub width: Option<f64>,
    /// Optional fixed height for the SVG output. If `None`, uses the bbox height.
    pub height: Option<f64>,
    /// Scale factor for the SVG output. Default is `1.0`.
    pub scale: f64,
    /// Draw node circles.
    pub show_nodes: bool,
    /// Draw disabled edges as dashed lines instead of hiding them.
    pub show_disabled: bool,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            scale: 1.0,
            show_nodes: true,
            show_disabled: true,
        }
    }
}

/// Renders a [`Table`] as SVG markup.
pub struct SvgRenderer<'a> {
    table: &'a Table,
}

impl<'a> SvgRenderer<'a> {
    pub fn new(table: &'a Table) -> Self {
        Self { table }
    }

    /// Generate a complete SVG 1.1 document.
    ///
    /// An empty table renders as an empty 0x0 document.
    pub fn to_svg(&self, options: &SvgOptions) -> String {
        let view = self.table.bbox().unwrap_or(BBox::new(0, 0, 0, 0));
        let view_width = view.width();
        let view_height = view.height();

        let svg_width = options
            .width
            .unwrap_or(f64::from(view_width) * options.scale);
        let svg_height = options
            .height
            .unwrap_or(f64::from(view_height) * options.scale);

        let mut svg = String::new();

        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" \
             width=\"{svg_width}\" height=\"{svg_height}\" \
             viewBox=\"{} {} {view_width} {view_height}\">\n",
            view.x0, view.top
        ));

        for (id, edge) in self.table.edges() {
            if edge.is_disabled() && !options.show_disabled {
                continue;
            }
            let Ok((s, t)) = self.table.edge_points(id) else {
                continue;
            };
            let style = if edge.is_disabled() {
                "stroke=\"gray\" stroke-width=\"1\" stroke-dasharray=\"4 3\""
            } else {
                "stroke=\"black\" stroke-width=\"2\""
            };
            svg.push_str(&format!(
                "  <line id=\"{id}\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" {style}/>\n",
                s.x, s.y, t.x, t.y
            ));
        }

        if options.show_nodes {
            for (id, node) in self.table.nodes() {
                svg.push_str(&format!(
                    "  <circle id=\"{id}\" cx=\"{}\" cy=\"{}\" r=\"{}\" \
                     fill=\"none\" stroke=\"red\" stroke-width=\"1\"/>\n",
                    node.x(),
                    node.y(),
                    node.radius()
                ));
            }
        }

        svg.push_str("</svg>\n");

        svg
    }
}
