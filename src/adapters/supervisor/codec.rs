use std::collections::HashMap;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("malformed XML-RPC response: {0}")]
    Malformed(String),

    #[error("supervisor fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("unexpected response shape: {0}")]
    Unexpected(String),
}

pub type RpcResult<T> = Result<T, RpcError>;

/// XML-RPC value, restricted to the types Supervisord actually sends
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Double(f64),
    Str(String),
    Array(Vec<Value>),
    Struct(HashMap<String, Value>),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Self::Struct(map) => Some(map),
            _ => None,
        }
    }
}

/// Encode a methodCall document
pub fn encode_request(method: &str, params: &[Value]) -> String {
    let mut body = String::with_capacity(128);
    body.push_str("<?xml version=\"1.0\"?>");
    body.push_str("<methodCall>");
    body.push_str("<methodName>");
    body.push_str(&escape(method));
    body.push_str("</methodName>");
    body.push_str("<params>");
    for param in params {
        body.push_str("<param>");
        encode_value(&mut body, param);
        body.push_str("</param>");
    }
    body.push_str("</params>");
    body.push_str("</methodCall>");
    body
}

fn encode_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::Int(i) => {
            out.push_str("<int>");
            out.push_str(&i.to_string());
            out.push_str("</int>");
        }
        Value::Bool(b) => {
            out.push_str(if *b {
                "<boolean>1</boolean>"
            } else {
                "<boolean>0</boolean>"
            });
        }
        Value::Double(d) => {
            out.push_str("<double>");
            out.push_str(&d.to_string());
            out.push_str("</double>");
        }
        Value::Str(s) => {
            out.push_str("<string>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</string>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                encode_value(out, item);
            }
            out.push_str("</data></array>");
        }
        Value::Struct(map) => {
            out.push_str("<struct>");
            for (name, member) in map {
                out.push_str("<member><name>");
                out.push_str(&escape(name.as_str()));
                out.push_str("</name>");
                encode_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

/// Decode a methodResponse document into its single result value, or
/// a typed error for a fault response.
pub fn parse_response(xml: &str) -> RpcResult<Value> {
    let mut cursor = Cursor::new(tokenize(xml)?);
    cursor.expect_open("methodResponse")?;

    match cursor.next()? {
        Token::Open(tag) if tag == "params" => {
            cursor.expect_open("param")?;
            let value = parse_value(&mut cursor)?;
            cursor.expect_close("param")?;
            cursor.expect_close("params")?;
            cursor.expect_close("methodResponse")?;
            Ok(value)
        }
        Token::Open(tag) if tag == "fault" => {
            let value = parse_value(&mut cursor)?;
            cursor.expect_close("fault")?;
            cursor.expect_close("methodResponse")?;

            let members = value
                .as_struct()
                .ok_or_else(|| RpcError::Malformed("fault without struct".into()))?;
            let code = members.get("faultCode").and_then(Value::as_i64).unwrap_or(0);
            let message = members
                .get("faultString")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            Err(RpcError::Fault { code, message })
        }
        other => Err(RpcError::Malformed(format!(
            "unexpected {other:?} inside methodResponse"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open(String),
    Close(String),
    Text(String),
}

fn tokenize(xml: &str) -> RpcResult<Vec<Token>> {
    let mut reader = Reader::from_str(xml);
    let mut tokens = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                tokens.push(Token::Open(tag_name(e.name().as_ref())));
            }
            Ok(Event::End(e)) => {
                tokens.push(Token::Close(tag_name(e.name().as_ref())));
            }
            Ok(Event::Empty(e)) => {
                let name = tag_name(e.name().as_ref());
                tokens.push(Token::Open(name.clone()));
                tokens.push(Token::Close(name));
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| RpcError::Malformed(e.to_string()))?;
                // Indentation between tags is noise, element content is not
                if !text.trim().is_empty() {
                    tokens.push(Token::Text(text.into_owned()));
                }
            }
            Ok(Event::CData(t)) => {
                tokens.push(Token::Text(
                    String::from_utf8_lossy(t.into_inner().as_ref()).into_owned(),
                ));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(RpcError::Malformed(e.to_string())),
        }
    }

    Ok(tokens)
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn next(&mut self) -> RpcResult<Token> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| RpcError::Malformed("truncated document".into()))?;
        self.pos += 1;
        Ok(token)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn expect_open(&mut self, tag: &str) -> RpcResult<()> {
        match self.next()? {
            Token::Open(name) if name == tag => Ok(()),
            other => Err(RpcError::Malformed(format!(
                "expected <{tag}>, found {other:?}"
            ))),
        }
    }

    fn expect_close(&mut self, tag: &str) -> RpcResult<()> {
        match self.next()? {
            Token::Close(name) if name == tag => Ok(()),
            other => Err(RpcError::Malformed(format!(
                "expected </{tag}>, found {other:?}"
            ))),
        }
    }
}

/// Parse one `<value>` element, cursor positioned at its open token
fn parse_value(cursor: &mut Cursor) -> RpcResult<Value> {
    cursor.expect_open("value")?;

    let value = match cursor.next()? {
        // A value without a type tag is a string
        Token::Text(text) => Value::Str(text),
        // <value/> and <value></value> are empty strings
        Token::Close(tag) if tag == "value" => return Ok(Value::Str(String::new())),
        Token::Open(tag) => {
            let value = match tag.as_str() {
                "int" | "i4" => {
                    let text = text_until_close(cursor, &tag)?;
                    Value::Int(text.trim().parse().map_err(|_| {
                        RpcError::Malformed(format!("invalid integer {text:?}"))
                    })?)
                }
                "boolean" => {
                    let text = text_until_close(cursor, &tag)?;
                    match text.trim() {
                        "1" | "true" => Value::Bool(true),
                        "0" | "false" => Value::Bool(false),
                        other => {
                            return Err(RpcError::Malformed(format!(
                                "invalid boolean {other:?}"
                            )))
                        }
                    }
                }
                "double" => {
                    let text = text_until_close(cursor, &tag)?;
                    Value::Double(text.trim().parse().map_err(|_| {
                        RpcError::Malformed(format!("invalid double {text:?}"))
                    })?)
                }
                "string" => Value::Str(text_until_close(cursor, &tag)?),
                "array" => {
                    cursor.expect_open("data")?;
                    let mut items = Vec::new();
                    while matches!(cursor.peek(), Some(Token::Open(t)) if t == "value") {
                        items.push(parse_value(cursor)?);
                    }
                    cursor.expect_close("data")?;
                    cursor.expect_close("array")?;
                    Value::Array(items)
                }
                "struct" => {
                    let mut members = HashMap::new();
                    while matches!(cursor.peek(), Some(Token::Open(t)) if t == "member") {
                        cursor.expect_open("member")?;
                        cursor.expect_open("name")?;
                        let name = text_until_close(cursor, "name")?;
                        let member = parse_value(cursor)?;
                        cursor.expect_close("member")?;
                        members.insert(name, member);
                    }
                    cursor.expect_close("struct")?;
                    Value::Struct(members)
                }
                other => {
                    return Err(RpcError::Unexpected(format!(
                        "unsupported value type <{other}>"
                    )))
                }
            };
            cursor.expect_close("value")?;
            return Ok(value);
        }
        other => {
            return Err(RpcError::Malformed(format!(
                "unexpected {other:?} inside <value>"
            )))
        }
    };

    cursor.expect_close("value")?;
    Ok(value)
}

/// Element text content, empty when the close tag follows immediately
fn text_until_close(cursor: &mut Cursor, tag: &str) -> RpcResult<String> {
    match cursor.next()? {
        Token::Text(text) => {
            cursor.expect_close(tag)?;
            Ok(text)
        }
        Token::Close(name) if name == tag => Ok(String::new()),
        other => Err(RpcError::Malformed(format!(
            "expected text inside <{tag}>, found {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_no_params() {
        let body = encode_request("supervisor.getAllProcessInfo", &[]);
        assert!(body.starts_with("<?xml version=\"1.0\"?>"));
        assert!(body.contains("<methodName>supervisor.getAllProcessInfo</methodName>"));
        assert!(body.contains("<params></params>"));
    }

    #[test]
    fn test_encode_escapes_strings() {
        let body = encode_request("supervisor.getProcessInfo", &[Value::Str("a<b&c".into())]);
        assert!(body.contains("<string>a&lt;b&amp;c</string>"));
    }

    #[test]
    fn test_parse_scalar_response() {
        let xml = "<?xml version=\"1.0\"?>\n<methodResponse>\n<params>\n<param>\n\
                   <value><int>4276</int></value>\n</param>\n</params>\n</methodResponse>";
        assert_eq!(parse_response(xml).unwrap(), Value::Int(4276));
    }

    #[test]
    fn test_parse_untagged_string() {
        let xml = "<methodResponse><params><param><value>supervisor</value></param>\
                   </params></methodResponse>";
        assert_eq!(parse_response(xml).unwrap(), Value::Str("supervisor".into()));
    }

    #[test]
    fn test_parse_empty_string_value() {
        let xml = "<methodResponse><params><param><value><string></string></value></param>\
                   </params></methodResponse>";
        assert_eq!(parse_response(xml).unwrap(), Value::Str(String::new()));
    }

    #[test]
    fn test_parse_process_info_array() {
        let xml = r#"<?xml version="1.0"?>
<methodResponse>
  <params>
    <param>
      <value>
        <array>
          <data>
            <value>
              <struct>
                <member><name>name</name><value><string>web</string></value></member>
                <member><name>group</name><value><string>web</string></value></member>
                <member><name>pid</name><value><i4>100</i4></value></member>
                <member><name>state</name><value><int>20</int></value></member>
                <member><name>statename</name><value><string>RUNNING</string></value></member>
                <member><name>spawnerr</name><value><string></string></value></member>
              </struct>
            </value>
            <value>
              <struct>
                <member><name>name</name><value><string>worker</string></value></member>
                <member><name>pid</name><value><i4>101</i4></value></member>
              </struct>
            </value>
          </data>
        </array>
      </value>
    </param>
  </params>
</methodResponse>"#;

        let value = parse_response(xml).unwrap();
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), 2);

        let web = entries[0].as_struct().unwrap();
        assert_eq!(web.get("name").unwrap().as_str(), Some("web"));
        assert_eq!(web.get("pid").unwrap().as_i64(), Some(100));
        assert_eq!(web.get("state").unwrap().as_i64(), Some(20));
        assert_eq!(web.get("spawnerr").unwrap().as_str(), Some(""));
    }

    #[test]
    fn test_parse_boolean_and_double() {
        let xml = "<methodResponse><params><param><value><array><data>\
                   <value><boolean>1</boolean></value>\
                   <value><double>12.5</double></value>\
                   </data></array></value></param></params></methodResponse>";
        let value = parse_response(xml).unwrap();
        assert_eq!(
            value.as_array().unwrap(),
            &[Value::Bool(true), Value::Double(12.5)]
        );
    }

    #[test]
    fn test_parse_fault() {
        let xml = r#"<methodResponse>
  <fault>
    <value>
      <struct>
        <member><name>faultCode</name><value><int>10</int></value></member>
        <member><name>faultString</name><value><string>BAD_NAME: web</string></value></member>
      </struct>
    </value>
  </fault>
</methodResponse>"#;

        match parse_response(xml) {
            Err(RpcError::Fault { code, message }) => {
                assert_eq!(code, 10);
                assert_eq!(message, "BAD_NAME: web");
            }
            other => panic!("expected fault, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_truncated_document() {
        let xml = "<methodResponse><params><param><value><int>1</int>";
        assert!(matches!(parse_response(xml), Err(RpcError::Malformed(_))));
    }

    #[test]
    fn test_parse_not_a_response() {
        let xml = "<html><body>404</body></html>";
        assert!(matches!(parse_response(xml), Err(RpcError::Malformed(_))));
    }

    #[test]
    fn test_parse_unescapes_entities() {
        let xml = "<methodResponse><params><param>\
                   <value><string>a &amp; b</string></value>\
                   </param></params></methodResponse>";
        assert_eq!(parse_response(xml).unwrap(), Value::Str("a & b".into()));
    }
}
