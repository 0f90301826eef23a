//! HTTPServer: an HTTP front end feeding requests into the pipeline

use serde::{Deserialize, Serialize};

use super::{
    Bindings, Implementation, Part, PartImpl, RegisteredPart, SupportCode, go_string_literal,
};
use crate::pin::PinDefinition;

/// Element type of the `requests` pin
pub const HTTP_REQUEST_TYPE: &str = "*HTTPRequest";

const HTTP_REQUEST_DECL: &str = "\
// HTTPRequest carries one HTTP request through the pipeline.
// The receiver writes the response and then calls Close.
type HTTPRequest struct {
\thttp.ResponseWriter
\tRequest *http.Request
\tdone    chan struct{}
}

// Close completes the request.
func (r *HTTPRequest) Close() {
\tclose(r.done)
}";

fn default_addr() -> String {
    ":8080".to_string()
}

/// Serves HTTP on `addr` and emits every request on `requests`.
///
/// The handler blocks until the pipeline calls `Close` on the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpServer {
    /// Listen address, e.g. `:8080`
    #[serde(default = "default_addr")]
    pub addr: String,
}

impl Default for HttpServer {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

impl PartImpl for HttpServer {
    fn pins(&self) -> Vec<PinDefinition> {
        vec![PinDefinition::output("requests", HTTP_REQUEST_TYPE)]
    }

    fn implementation(&self, bindings: &Bindings) -> Implementation {
        let handler = if bindings.is_bound("requests") {
            "\t\treq := &HTTPRequest{ResponseWriter: w, Request: r, done: make(chan struct{})}\n\
             \t\trequests <- req\n\
             \t\t<-req.done"
        } else {
            "\t\thttp.Error(w, \"no handler connected\", http.StatusServiceUnavailable)"
        };

        let addr = go_string_literal(&self.addr);
        let head = format!(
            "srv := &http.Server{{\n\
             \tAddr: {addr},\n\
             \tHandler: http.HandlerFunc(func(w http.ResponseWriter, r *http.Request) {{\n\
             {handler}\n\
             \t}}),\n\
             }}"
        );
        let body = format!(
            "if instanceNumber == 0 {{\n\
             \tif err := srv.ListenAndServe(); err != nil && err != http.ErrServerClosed {{\n\
             \t\tlog.Printf(\"HTTPServer %s: %v\", {addr}, err)\n\
             \t}}\n\
             }}"
        );

        Implementation {
            head,
            body,
            tail: String::new(),
        }
    }

    fn imports(&self) -> Vec<String> {
        vec!["log".to_string(), "net/http".to_string()]
    }

    fn support_code(&self) -> Option<SupportCode> {
        Some(SupportCode {
            key: "HTTPRequest".to_string(),
            code: HTTP_REQUEST_DECL.to_string(),
        })
    }

    fn validate(&self) -> Result<(), String> {
        if self.addr.trim().is_empty() {
            return Err("addr must not be empty".to_string());
        }
        Ok(())
    }
}

impl RegisteredPart for HttpServer {
    const TYPE_KEY: &'static str = "HTTPServer";
    const DESCRIPTION: &'static str = "Serves HTTP and emits each request as *HTTPRequest";
}

impl From<HttpServer> for Part {
    fn from(p: HttpServer) -> Self {
        Part::HttpServer(p)
    }
}
