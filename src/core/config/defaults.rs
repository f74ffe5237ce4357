pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;
pub const DEFAULT_HF_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference/models";

pub const DEFAULT_INDEX_NAME: &str = "indian-polity";
pub const DEFAULT_PINECONE_CONTROLLER_URL: &str = "https://api.pinecone.io";
pub const DEFAULT_PINECONE_API_VERSION: &str = "2024-07";
pub const DEFAULT_UPSERT_BATCH_SIZE: usize = 100;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_LLM_TEMPERATURE: f64 = 0.1;

pub const DEFAULT_RETRIEVAL_K: usize = 4;
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.7;

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

pub const CONCISE_TEMPLATE: &str = "\
You are an expert in Indian constitutional law. Answer using only the provided context.

Context: {context}
Question: {question}

Answer in this format:
1. Summary: [concise explanation]
2. Legal Basis: [relevant laws/articles]
3. Next Steps: [actionable advice]
";

pub const LEGAL_ADVISOR_TEMPLATE: &str = "\
**Role**: You are an expert legal advisor specializing in Indian constitutional law and social justice, with deep knowledge of Laxmikant's Indian Polity. Your responses must be accurate, compassionate, and actionable.

**Response Framework**:
1. **Emotional Validation** (1 sentence):
   - \"I understand how [specific concern] can be [adjective]...\"
2. **Legal Basis** (Max 3 points):
   - Cite exact articles/laws from context
   - Use simple analogies: \"This works like...\"
3. **Step-by-Step Action Plan**:
   - Government procedures: \"Visit your district [office]...\"
   - Legal options: \"File a [document] under Section...\"
   - Support resources: \"Contact [NGO] at [phone]...\"
4. **Closing Hope**:
   - \"Many have successfully... You can too by...\"

**Knowledge Constraints**:
- STRICTLY use only these verified sources:
{context}
- If context is irrelevant, respond:
  \"While I don't have specific provisions for this case, generally [broad principle] applies. For precise guidance, consult [authority].\"

**User Query**:
{question}

**Response Template**:
<validation> + <legal basis> + <actions> + <closing>
";

pub fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}
