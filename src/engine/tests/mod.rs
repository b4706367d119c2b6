use super::*;
use crate::types::{
    AdministrativeRole, Attributes, AuthenticationLevel, MicroOperation, ProtectedItem,
    SubtreeSpecification, UserClass, dn,
};
use insta::assert_snapshot;
use yare::parameterized;


const PEOPLE_ACL: &str = r#"[
    {
        "name": "people-acl",
        "uuid": "7f3c9a10-0001",
        "roles": ["accessControlSpecificArea"],
        "scope": {"base": "ou=people,dc=example"},
        "tuples": [
            {
                "grant": true,
                "precedence": 10,
                "user_classes": [{"type": "all_users"}],
                "protected_items": [{"type": "attribute_type", "value": ["mail"]}],
                "micro_operations": ["read", "compare"]
            },
            {
                "grant": false,
                "precedence": 10,
                "user_classes": [{"type": "all_users"}],
                "protected_items": [{"type": "entry"}],
                "micro_operations": ["read"]
            },
            {
                "grant": true,
                "precedence": 20,
                "user_classes": [{"type": "name", "value": ["cn=admin,dc=example"]}],
                "protected_items": [{"type": "all_user_attribute_types_and_values"}],
                "micro_operations": ["read", "compare", "modify", "add", "remove"]
            },
            {
                "grant": false,
                "precedence": 30,
                "user_classes": [{"type": "all_users"}],
                "protected_items": [{"type": "attribute_type", "value": ["userPassword"]}],
                "micro_operations": ["read", "compare"]
            }
        ]
    },
    {
        "name": "groups-acl",
        "uuid": "7f3c9a10-0002",
        "roles": ["accessControlSpecificArea"],
        "scope": {"base": "ou=groups,dc=example"},
        "tuples": [
            {
                "grant": true,
                "precedence": 5,
                "user_classes": [{"type": "user_group", "value": ["cn=staff,ou=groups,dc=example"]}],
                "protected_items": [{"type": "entry"}],
                "micro_operations": ["browse", "returnDN"]
            },
            {
                "grant": true,
                "precedence": 5,
                "user_classes": [{"type": "all_users"}],
                "protected_items": [{
                    "type": "restricted_by",
                    "value": [{"attribute": "member", "values_in": "uniqueMember"}]
                }],
                "micro_operations": ["add"]
            }
        ]
    },
    {
        "name": "people-collective",
        "uuid": "7f3c9a10-0003",
        "roles": ["collectiveAttributeSpecificArea"],
        "scope": {"base": "ou=people,dc=example", "chop_before": ["ou=archive"]}
    }
]"#;

const ALICE: &str = "cn=alice,ou=people,dc=example";
const BOB: &str = "cn=bob,ou=people,dc=example";
const ADMIN: &str = "cn=admin,dc=example";

fn engine() -> AciEngine {
    AciEngine::new_from_json(PEOPLE_ACL).expect("subentries should load")
}

fn request(
    user: &str,
    target: &str,
    attribute: Option<&str>,
    op: MicroOperation,
) -> EvaluationContext {
    let builder = EvaluationContext::builder(dn(target).unwrap())
        .user_name(dn(user).unwrap())
        .micro_operation(op);
    match attribute {
        Some(attr) => builder.attribute(attr).build(),
        None => builder.build(),
    }
}

fn read_mail_subentry() -> Subentry {
    let grant_mail = AciTuple::grant()
        .precedence(10)
        .user_class(UserClass::AllUsers)
        .protected_item(ProtectedItem::attribute_types(["mail"]))
        .micro_operation(MicroOperation::Read)
        .build()
        .unwrap();
    let deny_entry = AciTuple::deny()
        .precedence(10)
        .user_class(UserClass::AllUsers)
        .protected_item(ProtectedItem::Entry)
        .micro_operation(MicroOperation::Read)
        .build()
        .unwrap();
    Subentry::new(
        "people",
        Arc::new(SubtreeSpecification::new(dn("ou=people,dc=example").unwrap())),
        [AdministrativeRole::AccessControlSpecificArea],
    )
    .unwrap()
    .with_tuples([grant_mail, deny_entry])
}

#[derive(Clone)]
struct SharedLogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

struct SharedLogWriter(Arc<std::sync::Mutex<Vec<u8>>>);

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedLogBuffer {
    type Writer = SharedLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SharedLogWriter(Arc::clone(&self.0))
    }
}

impl std::io::Write for SharedLogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Route every tracing event in the process to one shared buffer.
fn captured_logs() -> SharedLogBuffer {
    use std::sync::OnceLock;

    static LOG_SINK: OnceLock<SharedLogBuffer> = OnceLock::new();
    LOG_SINK
        .get_or_init(|| {
            let sink = SharedLogBuffer(Arc::new(std::sync::Mutex::new(Vec::new())));
            let subscriber = tracing_subscriber::fmt()
                .with_ansi(false)
                .without_time()
                .with_target(false)
                .with_max_level(tracing::Level::DEBUG)
                .with_writer(sink.clone())
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .expect("global test subscriber should initialize");
            tracing::callsite::rebuild_interest_cache();
            sink
        })
        .clone()
}

fn assert_grant(verdict: Verdict) {
    assert_eq!(verdict, Verdict::Grant);
}

fn assert_denied(verdict: Verdict) {
    assert!(!verdict.is_grant(), "expected a denial, got {verdict}");
}

include!("evaluate.rs");
