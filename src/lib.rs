/*!

# space_launch_gateway

A [GraphQL][GraphQL] gateway over space launches and user trip bookings,
built on [Juniper][Juniper] and served through [AWS Api Gateway][AWS Api Gateway]
on the [AWS Lambda Runtime][AWS Lambda Runtime].

## Schema

```graphql
enum PatchSize { SMALL LARGE }
type Rocket  { id: ID! name: String type: String }
type Mission { name: String missionPatch(size: PatchSize): String }
type Launch  { id: ID! site: String mission: Mission! rocket: Rocket! isBooked: Boolean! }
type User    { id: ID! email: String! trips: [Launch!]! }
type Query   { launches: [Launch!]! launch(id: ID!): Launch me: User }
```

Launches come from the SpaceX REST api, users and their trips from a local
store. The requesting user is identified by the base64 encoded email sent
in the `Authorization` header.

## Configuration

| variable                  | default                           |
|---------------------------|-----------------------------------|
| `LAUNCH_API_URL`          | `https://api.spacexdata.com/v2/`  |
| `LAUNCH_API_TIMEOUT_SECS` | `10`                              |
| `USER_STORE_PATH`         | in memory store                   |
| `GRAPHQL_PLAYGROUND`      | `true`                            |
| `GRAPHQL_ENDPOINT`        | `/graphql`                        |

[AWS Api Gateway]: https://aws.amazon.com/api-gateway/
[AWS Lambda Runtime]: https://github.com/awslabs/aws-lambda-rust-runtime
[Juniper]: https://github.com/graphql-rust/juniper
[GraphQL]: http://graphql.org

*/

pub mod config;
pub mod context;
pub mod datasources;
pub mod error;
pub mod handler;
pub mod types;

pub use crate::config::Config;
pub use crate::context::{Context, DataSources};
pub use crate::error::{Error, Result};
pub use crate::handler::GraphQLHandler;
pub use crate::types::{schema, Schema};
