//! DOM element text surface.

use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, Window};

use crate::sizing::parse_css_px;
use crate::surface::{FontProbe, Measure, Measurement, TextSurface};

const PROBE_TEXT: &str = "MMMMMMMMMM";

/// A DOM element (usually a `<pre>`) used as the animator's surface.
#[derive(Clone, Debug)]
pub struct ElementSurface {
    element: HtmlElement,
}

impl ElementSurface {
    pub fn new(element: HtmlElement) -> Self {
        Self { element }
    }

    /// Look up `id` in the current document.
    pub fn by_id(id: &str) -> Option<Self> {
        web_sys::window()?
            .document()?
            .get_element_by_id(id)?
            .dyn_into::<HtmlElement>()
            .ok()
            .map(Self::new)
    }

    #[inline]
    pub fn element(&self) -> &HtmlElement {
        &self.element
    }

    fn viewport(window: &Window) -> (f64, f64) {
        if let Some(vv) = window.visual_viewport() {
            return (vv.width(), vv.height());
        }
        let client = window
            .document()
            .and_then(|d| d.document_element())
            .map(|e| (e.client_width() as f64, e.client_height() as f64))
            .unwrap_or((0.0, 0.0));
        (
            client.0.max(js_number(window.inner_width())),
            client.1.max(js_number(window.inner_height())),
        )
    }

    fn probe(&self, window: &Window) -> Option<FontProbe> {
        let style = window.get_computed_style(&self.element).ok().flatten()?;
        let font_size = style
            .get_property_value("font-size")
            .ok()
            .and_then(|v| parse_css_px(&v))
            .unwrap_or(12.0);
        let line_height = style
            .get_property_value("line-height")
            .ok()
            .and_then(|v| if v.trim() == "normal" { None } else { parse_css_px(&v) });

        let document = window.document()?;
        let span = document
            .create_element("span")
            .ok()?
            .dyn_into::<HtmlElement>()
            .ok()?;
        span.set_text_content(Some(PROBE_TEXT));
        let span_style = span.style();
        let _ = span_style.set_property("visibility", "hidden");
        let _ = span_style.set_property("white-space", "pre");
        let _ = span_style.set_property("position", "absolute");

        self.element.append_child(&span).ok()?;
        let probe_width = span.get_bounding_client_rect().width();
        let _ = self.element.remove_child(&span);

        Some(FontProbe {
            font_size,
            line_height,
            probe_width,
            probe_len: PROBE_TEXT.len(),
        })
    }
}

fn js_number(value: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>) -> f64 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
}

impl Measure for ElementSurface {
    fn measure(&self) -> Measurement {
        let Some(window) = web_sys::window() else {
            return Measurement::viewport(0.0, 0.0);
        };

        let rect = self.element.get_bounding_client_rect();
        let (width, height) = if rect.width() > 0.0 && rect.height() > 0.0 {
            (rect.width(), rect.height())
        } else {
            Self::viewport(&window)
        };

        Measurement {
            width,
            height,
            inner_width: js_number(window.inner_width()),
            probe: self.probe(&window),
        }
    }
}

impl TextSurface for ElementSurface {
    fn set_text(&mut self, text: &str) {
        self.element.set_text_content(Some(text));
    }
}
