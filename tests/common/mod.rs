//! Shared fixtures for the integration tests
#![allow(dead_code)]

use nestmut::prelude::*;
use serde_json::Map;

pub const SDL: &str = r#"
    enum ImageableType { Post User }

    type User { id: ID! name: String email: String }
    type Task { id: ID! name: String! user_id: ID }
    type Phone { id: ID! number: String user_id: ID }
    type Role { id: ID! name: String }
    type Company { id: ID! name: String }
    type Post { id: ID! title: String }
    type Image { id: ID! url: String imageable_id: ID imageable_type: String }

    input CreateTaskInput { name: String! user: UserBelongsTo }
    input UpdateTaskInput { id: ID! name: String user: UserBelongsTo }
    input UpsertTaskInput { id: ID name: String! }

    input UserBelongsTo {
        create: CreateUserInput
        connect: ID
        update: UpdateUserInput
        upsert: UpsertUserInput
        disconnect: Boolean
        delete: Boolean
    }

    input CreateUserInput {
        name: String!
        email: String
        tasks: TasksHasMany
        phone: PhoneHasOne
        roles: RolesBelongsToMany
    }

    input UpdateUserInput {
        id: ID!
        name: String
        email: String
        tasks: TasksHasMany
        phone: PhoneHasOne
        roles: RolesBelongsToMany
    }

    input UpsertUserInput { id: ID name: String! email: String }

    input TasksHasMany {
        create: [CreateTaskInput!]
        update: [UpdateTaskInput!]
        upsert: [UpsertTaskInput!] @upsert(identifyingColumns: ["name"])
        connect: [ID!]
        disconnect: [ID!]
        delete: [ID!]
    }

    input PhoneHasOne {
        create: CreatePhoneInput
        update: UpdatePhoneInput
        connect: ID
        disconnect: ID
        delete: ID
    }
    input CreatePhoneInput { number: String! }
    input UpdatePhoneInput { id: ID! number: String }

    input RolesBelongsToMany {
        sync: [ID!]
        syncWithoutDetaching: [ID!]
        create: [CreateRoleInput!]
        update: [UpdateRoleInput!]
        delete: [ID!]
        connect: [ID!]
        disconnect: [ID!]
    }
    input CreateRoleInput { name: String! users: UsersBelongsToMany }
    input UpdateRoleInput { id: ID! name: String users: UsersBelongsToMany }

    input UsersBelongsToMany {
        sync: [UserPivotInput!]
        syncWithoutDetaching: [UserPivotInput!]
        connect: [UserPivotInput!]
        disconnect: [ID!]
        delete: [ID!]
        create: [CreateUserInput!]
    }
    input UserPivotInput { id: ID! meta: String }

    input UpdateCompanyInput { id: ID! name: String logo: LogoHasOne }
    input LogoHasOne { create: CreateAttachedImageInput connect: ID disconnect: ID }

    input CreateImageInput { url: String! imageable: ImageableMorphTo }
    input UpdateImageInput { id: ID! url: String imageable: ImageableMorphTo }
    input ImageableMorphTo {
        connect: ImageableConnect
        create: CreatePostInput
        update: CreatePostInput
        upsert: CreatePostInput
        disconnect: Boolean
        delete: Boolean
    }
    input ImageableConnect { type: ImageableType! id: ID! }
    input CreatePostInput { title: String images: ImagesMorphMany }
    input UpdatePostInput { id: ID! title: String images: ImagesMorphMany }
    input ImagesMorphMany {
        create: [CreateAttachedImageInput!]
        connect: [ID!]
        disconnect: [ID!]
    }
    input CreateAttachedImageInput { url: String! }

    type Mutation {
        createTask(input: CreateTaskInput! @spread): Task! @create
        updateTask(input: UpdateTaskInput! @spread): Task @update
        upsertTask(input: UpsertTaskInput! @spread): Task @upsert
        deleteTask(id: ID!): Task @delete
        createUser(input: CreateUserInput! @spread): User! @create
        updateUser(input: UpdateUserInput! @spread): User @update
        upsertUser(input: UpsertUserInput! @spread): User @upsert(identifyingColumns: ["email"])
        createRole(input: CreateRoleInput! @spread): Role! @create
        updateRole(input: UpdateRoleInput! @spread): Role @update
        updateCompany(input: UpdateCompanyInput! @spread): Company @update
        createImage(input: CreateImageInput! @spread): Image @create
        updateImage(input: UpdateImageInput! @spread): Image @update
        createPost(input: CreatePostInput! @spread): Post! @create
        updatePost(input: UpdatePostInput! @spread): Post @update
    }
"#;

pub const MODELS: &str = r#"
models:
  - name: Task
    relations:
      - field: user
        kind: owning_to_one
        related: User
        foreign_key: user_id
  - name: User
    relations:
      - field: tasks
        kind: owned_to_many
        related: Task
        foreign_key: user_id
      - field: phone
        kind: owned_to_one
        related: Phone
        foreign_key: user_id
      - field: roles
        kind: many_to_many
        related: Role
        pivot: role_user
        foreign_pivot_key: user_id
        related_pivot_key: role_id
  - name: Role
    relations:
      - field: users
        kind: many_to_many
        related: User
        pivot: role_user
        foreign_pivot_key: role_id
        related_pivot_key: user_id
  - name: Phone
  - name: Company
    relations:
      - field: logo
        kind: owned_to_one
        related: Image
        foreign_key: imageable_id
        morph_type: imageable_type
        morph_class: company
  - name: Post
    relations:
      - field: images
        kind: owned_to_many
        related: Image
        foreign_key: imageable_id
        morph_type: imageable_type
  - name: Image
    relations:
      - field: imageable
        kind: owning_to_one_polymorphic
        foreign_key: imageable_id
        morph_type: imageable_type
"#;

/// Install a test subscriber once; RUST_LOG controls the output
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Fixture {
    pub store: Arc<InMemoryRecordStore>,
    pub registry: Arc<TypeRegistry>,
    pub executor: MutationExecutor,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();
        let registry = Arc::new(TypeRegistry::from_sdl(SDL).expect("fixture schema should parse"));
        let config = ModelsConfig::from_yaml_str(MODELS).expect("fixture models should load");
        let store = Arc::new(InMemoryRecordStore::new(config));
        let executor = MutationExecutor::new(registry.clone(), store.clone());
        Self {
            store,
            registry,
            executor,
        }
    }

    pub fn engine(&self) -> &MutationEngine {
        self.executor.engine()
    }

    /// Run a mutation and return its `data` object
    pub async fn run(&self, document: &str) -> Value {
        let result = self
            .executor
            .execute(document, None)
            .await
            .unwrap_or_else(|e| panic!("mutation failed: {}", e));
        result["data"].clone()
    }

    pub async fn run_err(&self, document: &str) -> EngineError {
        self.executor
            .execute(document, None)
            .await
            .expect_err("mutation should fail")
    }

    /// Save a record directly, bypassing the engine
    pub async fn seed(&self, model: &str, attributes: Value) -> Record {
        let mut record = Record::new(model);
        if let Value::Object(map) = attributes {
            record.fill(map);
        }
        self.store.save(&mut record).await.expect("seed should save");
        record
    }

    pub async fn find(&self, model: &str, key: Value) -> Option<Record> {
        self.store.find_by_key(model, &key).await.expect("find")
    }

    /// Journal as (action, target) pairs
    pub fn writes(&self) -> Vec<(String, String)> {
        self.store
            .journal()
            .expect("journal")
            .into_iter()
            .map(|envelope| {
                (
                    envelope.event.action().to_string(),
                    envelope.event.target().to_string(),
                )
            })
            .collect()
    }

    pub fn writes_since(&self, start: usize) -> Vec<(String, String)> {
        self.writes().into_iter().skip(start).collect()
    }
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

pub fn pair(action: &str, target: &str) -> (String, String) {
    (action.to_string(), target.to_string())
}
