//! SOAP 1.1 envelopes and response parsing for the SCP end-user webservice
//!
//! Responses are stream-parsed by element local name, so namespace
//! prefixes chosen by the server do not matter.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use throttlewatch_core::traits::{IpAddresses, InterfaceEntry, MalformedInterface, ServerInfo, ServerInterface};
use throttlewatch_core::{Error, Result};

/// Target namespace of the end-user webservice
pub const NAMESPACE: &str = "http://enduser.service.web.vcp.netcup.de/";

const ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

const PROVIDER: &str = "netcup";

/// Build the request envelope for `operation` with the given parameters
///
/// Parameter values are XML-escaped; names are written as given.
pub fn envelope(operation: &str, params: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, value) in params {
        body.push_str(&format!("<{name}>{}</{name}>", escape(*value)));
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<soapenv:Envelope xmlns:soapenv="{envelope_ns}" xmlns:tns="{service_ns}">"#,
            "<soapenv:Header/>",
            "<soapenv:Body><tns:{operation}>{body}</tns:{operation}></soapenv:Body>",
            "</soapenv:Envelope>"
        ),
        envelope_ns = ENVELOPE_NAMESPACE,
        service_ns = NAMESPACE,
        operation = operation,
        body = body,
    )
}

/// Extract the fault message if the document is a SOAP fault
pub fn fault_message(xml: &str) -> Option<String> {
    let mut in_fault = false;
    let mut message = None;

    walk(xml, |item| match item {
        Item::Start { name, .. } if name == "Fault" => in_fault = true,
        Item::Text { element, text, .. } if in_fault && element == "faultstring" => {
            message = Some(text.to_string());
        }
        _ => {}
    })
    .ok()?;

    match (in_fault, message) {
        (true, Some(message)) => Some(message),
        (true, None) => Some("unspecified SOAP fault".to_string()),
        (false, _) => None,
    }
}

/// Parse a `getVServersResponse` into server names
pub fn parse_vservers(xml: &str) -> Result<Vec<String>> {
    reject_fault(xml)?;

    let mut servers = Vec::new();
    let mut answered = false;
    walk(xml, |item| match item {
        Item::Start { name, .. } if name == "getVServersResponse" => answered = true,
        Item::Text { element, text, .. } if element == "return" && !text.is_empty() => {
            servers.push(text.to_string());
        }
        _ => {}
    })?;

    if !answered {
        return Err(unexpected("getVServersResponse"));
    }

    Ok(servers)
}

/// Parse a `getVServerInformationResponse`
///
/// Each `serverInterfaces` element becomes one interface entry, in document
/// order. `trafficThrottled` accepts the xsd:boolean lexical forms
/// (`true`, `false`, `1`, `0`); any other value makes the interface
/// malformed.
pub fn parse_vserver_information(xml: &str) -> Result<ServerInfo> {
    reject_fault(xml)?;

    let mut interfaces = Vec::new();
    let mut current: Option<InterfaceDraft> = None;
    let mut answered = false;

    walk(xml, |item| match item {
        Item::Start { name, .. } if name == "getVServerInformationResponse" => answered = true,
        Item::Start { name, depth } => match current.as_mut() {
            Some(draft) if depth == draft.depth + 1 => draft.field(name),
            Some(_) => {}
            None if name == "serverInterfaces" => current = Some(InterfaceDraft::new(depth)),
            None => {}
        },
        Item::Text { element, text, depth } => {
            if let Some(draft) = current.as_mut() {
                if depth == draft.depth + 1 {
                    draft.value(element, text);
                }
            }
        }
        Item::End { depth } => {
            if current.as_ref().is_some_and(|draft| draft.depth == depth) {
                if let Some(draft) = current.take() {
                    interfaces.push(draft.finish());
                }
            }
        }
    })?;

    if !answered {
        return Err(unexpected("getVServerInformationResponse"));
    }

    Ok(ServerInfo { interfaces })
}

fn reject_fault(xml: &str) -> Result<()> {
    match fault_message(xml) {
        Some(message) => Err(Error::provider(PROVIDER, message)),
        None => Ok(()),
    }
}

/// Attributes of one `serverInterfaces` element collected so far
struct InterfaceDraft {
    depth: usize,
    fields: Vec<String>,
    addresses: Vec<String>,
    throttled: Option<String>,
}

impl InterfaceDraft {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            fields: Vec::new(),
            addresses: Vec::new(),
            throttled: None,
        }
    }

    fn field(&mut self, name: &str) {
        if !self.fields.iter().any(|field| field == name) {
            self.fields.push(name.to_string());
        }
    }

    fn value(&mut self, element: &str, text: &str) {
        match element {
            "ipv4IP" => self.addresses.push(text.to_string()),
            "trafficThrottled" => self.throttled = Some(text.to_string()),
            _ => {}
        }
    }

    fn finish(self) -> InterfaceEntry {
        let traffic_throttled = match self.throttled.as_deref() {
            None => None,
            Some("true" | "1") => Some(true),
            Some("false" | "0") => Some(false),
            Some(other) => {
                return Err(MalformedInterface {
                    reason: format!("trafficThrottled is not a boolean: {:?}", other),
                    fields: self.fields,
                });
            }
        };

        let ipv4_addresses = if self.addresses.is_empty() {
            None
        } else {
            Some(IpAddresses::Many(self.addresses))
        };

        Ok(ServerInterface {
            ipv4_addresses,
            traffic_throttled,
        })
    }
}

/// Parse events reduced to what the parsers need
///
/// `depth` counts enclosing elements: the document element has depth 1.
/// Empty elements (`<x/>`) are reported as a start immediately followed by
/// an end.
enum Item<'a> {
    Start { name: &'a str, depth: usize },
    Text { element: &'a str, text: &'a str, depth: usize },
    End { depth: usize },
}

fn walk(xml: &str, mut visit: impl FnMut(Item<'_>)) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                if let Some(name) = path.last() {
                    visit(Item::Start {
                        name,
                        depth: path.len(),
                    });
                }
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                visit(Item::Start {
                    name: &name,
                    depth: path.len() + 1,
                });
                visit(Item::End {
                    depth: path.len() + 1,
                });
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(malformed)?;
                if let Some(element) = path.last() {
                    visit(Item::Text {
                        element,
                        text: &text,
                        depth: path.len(),
                    });
                }
            }
            Ok(Event::CData(c)) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                if let Some(element) = path.last() {
                    visit(Item::Text {
                        element,
                        text: &text,
                        depth: path.len(),
                    });
                }
            }
            Ok(Event::End(_)) => {
                visit(Item::End { depth: path.len() });
                path.pop();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(malformed(e)),
        }
    }

    Ok(())
}

fn malformed(e: impl std::fmt::Display) -> Error {
    Error::collection(format!("malformed SOAP response: {}", e))
}

/// Well-formed XML that does not carry the expected response element,
/// e.g. a maintenance page served with status 200
fn unexpected(element: &str) -> Error {
    Error::provider(
        PROVIDER,
        format!("unexpected response: no {} element", element),
    )
}
